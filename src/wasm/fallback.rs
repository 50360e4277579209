use web_sys::{Document, Element, HtmlElement};

use crate::error::Result;
use crate::selector::static_gradient_css;

/// The no-animation hero: a gradient on the container and the title as
/// plain text.
pub struct StaticHero {
    container: HtmlElement,
    title: Option<Element>,
    /// Inline `background` the gradient replaced; restored on dispose.
    previous_background: String,
}

impl StaticHero {
    /// Never fails; DOM errors only cost the text overlay.
    pub fn mount(document: &Document, container: &HtmlElement, title: &str, subtitle: &str, dark: bool) -> Self {
        let previous_background = container
            .style()
            .get_property_value("background")
            .unwrap_or_default();
        let mut hero = Self {
            container: container.clone(),
            title: None,
            previous_background,
        };
        hero.set_dark_mode(dark);
        match build_title(document, title, subtitle, dark) {
            Ok(el) => match container.append_child(&el) {
                Ok(_) => hero.title = Some(el),
                Err(err) => log::warn!("static title not attached: {err:?}"),
            },
            Err(err) => log::warn!("static title not built: {err}"),
        }
        hero
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        let style = self.container.style();
        if let Err(err) = style.set_property("background", static_gradient_css(dark)) {
            log::warn!("setting gradient failed: {err:?}");
        }
        if let Some(title) = &self.title {
            if let Err(err) = title.set_attribute("style", &text_style(dark)) {
                log::warn!("restyling static title failed: {err:?}");
            }
        }
    }

    pub fn set_text(&mut self, title: &str, subtitle: &str) {
        if let Some(el) = &self.title {
            if let Some(h1) = el.first_element_child() {
                h1.set_text_content(Some(title));
            }
            if let Some(p) = el.last_element_child() {
                p.set_text_content(Some(subtitle));
            }
        }
    }

    pub fn dispose(&mut self) {
        if let Some(el) = self.title.take() {
            el.remove();
        }
        let style = self.container.style();
        let restored = if self.previous_background.is_empty() {
            style.remove_property("background").map(drop)
        } else {
            style.set_property("background", &self.previous_background)
        };
        if let Err(err) = restored {
            log::warn!("restoring container background failed: {err:?}");
        }
    }
}

fn text_style(dark: bool) -> String {
    let color = if dark { "#ffffff" } else { "#333333" };
    format!("position:absolute;inset:0;display:flex;flex-direction:column;align-items:center;justify-content:center;color:{color};font-family:sans-serif;pointer-events:none")
}

fn build_title(document: &Document, title: &str, subtitle: &str, dark: bool) -> Result<Element> {
    let wrap = document.create_element("div")?;
    wrap.set_attribute("style", &text_style(dark))?;
    let h1 = document.create_element("h1")?;
    h1.set_text_content(Some(title));
    let p = document.create_element("p")?;
    p.set_text_content(Some(subtitle));
    wrap.append_child(&h1)?;
    wrap.append_child(&p)?;
    Ok(wrap)
}
