use js_sys::Float32Array;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject, WebglLoseContext,
};

use crate::error::{FxError, Result, ShaderStage};
use crate::shader::GpuBackend;

/// [`GpuBackend`] over a WebGL2 context on one canvas.
pub struct WebGlBackend {
    canvas: HtmlCanvasElement,
    gl: GL,
    vao: Option<WebGlVertexArrayObject>,
}

impl WebGlBackend {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| FxError::CapabilityUnavailable("WebGL2 not supported".into()))?
            .dyn_into::<GL>()
            .map_err(|_| FxError::CapabilityUnavailable("webgl2 context has wrong type".into()))?;
        Ok(Self {
            canvas,
            gl,
            vao: None,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<WebGlShader> {
        let kind = match stage {
            ShaderStage::Vertex => GL::VERTEX_SHADER,
            ShaderStage::Fragment => GL::FRAGMENT_SHADER,
        };
        let shader = self
            .gl
            .create_shader(kind)
            .ok_or(FxError::ResourceAllocation("shader object"))?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);

        let ok = self
            .gl
            .get_shader_parameter(&shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !ok {
            let log = self.gl.get_shader_info_log(&shader).unwrap_or_default();
            self.gl.delete_shader(Some(&shader));
            return Err(FxError::ShaderCompile { stage, log });
        }
        Ok(shader)
    }
}

impl GpuBackend for WebGlBackend {
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;
    type Texture = WebGlTexture;
    type Uniform = WebGlUniformLocation;

    fn layout_size(&self) -> (f64, f64) {
        let parent = self
            .canvas
            .parent_element()
            .map(|p| (f64::from(p.client_width()), f64::from(p.client_height())))
            .filter(|&(w, h)| w > 0.0 && h > 0.0);
        if let Some(size) = parent {
            return size;
        }
        let Some(win) = web_sys::window() else {
            return (1.0, 1.0);
        };
        let dim = |v: std::result::Result<wasm_bindgen::JsValue, _>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0)
        };
        (dim(win.inner_width()), dim(win.inner_height()))
    }

    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window().map_or(1.0, |w| w.device_pixel_ratio())
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<WebGlProgram> {
        let vs = self.compile_stage(ShaderStage::Vertex, vertex)?;
        let fs = match self.compile_stage(ShaderStage::Fragment, fragment) {
            Ok(fs) => fs,
            Err(err) => {
                self.gl.delete_shader(Some(&vs));
                return Err(err);
            }
        };
        let Some(program) = self.gl.create_program() else {
            self.gl.delete_shader(Some(&vs));
            self.gl.delete_shader(Some(&fs));
            return Err(FxError::ResourceAllocation("shader program"));
        };
        self.gl.attach_shader(&program, &vs);
        self.gl.attach_shader(&program, &fs);
        self.gl.link_program(&program);

        // Shader objects are not needed once linked (or once linking failed).
        self.gl.detach_shader(&program, &vs);
        self.gl.detach_shader(&program, &fs);
        self.gl.delete_shader(Some(&vs));
        self.gl.delete_shader(Some(&fs));

        let linked = self
            .gl
            .get_program_parameter(&program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !linked {
            let log = self.gl.get_program_info_log(&program).unwrap_or_default();
            self.gl.delete_program(Some(&program));
            return Err(FxError::ProgramLink(log));
        }
        Ok(program)
    }

    fn create_quad(&mut self, program: &WebGlProgram, vertices: &[f32]) -> Result<WebGlBuffer> {
        let vao = self
            .gl
            .create_vertex_array()
            .ok_or(FxError::ResourceAllocation("vertex array"))?;
        let Some(buffer) = self.gl.create_buffer() else {
            self.gl.delete_vertex_array(Some(&vao));
            return Err(FxError::ResourceAllocation("vertex buffer"));
        };
        self.gl.bind_vertex_array(Some(&vao));
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        let data = Float32Array::from(vertices);
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &data, GL::STATIC_DRAW);

        let location = self.gl.get_attrib_location(program, "a_position");
        let location = u32::try_from(location).unwrap_or(0);
        self.gl.enable_vertex_attrib_array(location);
        self.gl
            .vertex_attrib_pointer_with_i32(location, 2, GL::FLOAT, false, 0, 0);
        self.gl.bind_vertex_array(None);

        self.vao = Some(vao);
        Ok(buffer)
    }

    fn create_spectrum_texture(&mut self, bands: usize) -> Result<WebGlTexture> {
        let texture = self
            .gl
            .create_texture()
            .ok_or(FxError::ResourceAllocation("spectrum texture"))?;
        self.gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
        // Float textures are not filterable everywhere; NEAREST always works.
        for (param, value) in [
            (GL::TEXTURE_MIN_FILTER, GL::NEAREST),
            (GL::TEXTURE_MAG_FILTER, GL::NEAREST),
            (GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE),
            (GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE),
        ] {
            self.gl.tex_parameteri(GL::TEXTURE_2D, param, value as i32);
        }
        let zeros = Float32Array::new_with_length(bands as u32);
        let upload = self.gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_array_buffer_view(
            GL::TEXTURE_2D,
            0,
            GL::R32F as i32,
            bands as i32,
            1,
            0,
            GL::RED,
            GL::FLOAT,
            Some(&zeros),
        );
        if let Err(err) = upload {
            self.gl.delete_texture(Some(&texture));
            return Err(err.into());
        }
        Ok(texture)
    }

    fn uniform_location(&mut self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn backing_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn resize_backing(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn use_program(&mut self, program: &WebGlProgram) {
        self.gl.use_program(Some(program));
    }

    fn set_float(&mut self, location: &WebGlUniformLocation, value: f32) {
        self.gl.uniform1f(Some(location), value);
    }

    fn set_vec2(&mut self, location: &WebGlUniformLocation, x: f32, y: f32) {
        self.gl.uniform2f(Some(location), x, y);
    }

    fn set_bool(&mut self, location: &WebGlUniformLocation, value: bool) {
        self.gl.uniform1i(Some(location), i32::from(value));
    }

    fn upload_spectrum(
        &mut self,
        texture: &WebGlTexture,
        location: &WebGlUniformLocation,
        unit: u32,
        bands: &[f32],
    ) -> Result<()> {
        self.gl.active_texture(GL::TEXTURE0 + unit);
        self.gl.bind_texture(GL::TEXTURE_2D, Some(texture));
        let data = Float32Array::from(bands);
        self.gl
            .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_array_buffer_view(
                GL::TEXTURE_2D,
                0,
                GL::R32F as i32,
                bands.len() as i32,
                1,
                0,
                GL::RED,
                GL::FLOAT,
                Some(&data),
            )?;
        self.gl.uniform1i(Some(location), unit as i32);
        Ok(())
    }

    fn draw_quad(&mut self, _quad: &WebGlBuffer, vertex_count: i32) {
        // The vertex array already references the buffer.
        self.gl.bind_vertex_array(self.vao.as_ref());
        self.gl.draw_arrays(GL::TRIANGLES, 0, vertex_count);
    }

    fn delete_program(&mut self, program: WebGlProgram) {
        self.gl.use_program(None);
        self.gl.delete_program(Some(&program));
    }

    fn delete_buffer(&mut self, buffer: WebGlBuffer) {
        self.gl.bind_vertex_array(None);
        if let Some(vao) = self.vao.take() {
            self.gl.delete_vertex_array(Some(&vao));
        }
        self.gl.delete_buffer(Some(&buffer));
    }

    fn delete_texture(&mut self, texture: WebGlTexture) {
        self.gl.delete_texture(Some(&texture));
    }

    fn release_context(&mut self) {
        match self.gl.get_extension("WEBGL_lose_context") {
            Ok(Some(ext)) => ext.unchecked_into::<WebglLoseContext>().lose_context(),
            Ok(None) => log::debug!("WEBGL_lose_context unavailable; context left to GC"),
            Err(err) => log::warn!("querying WEBGL_lose_context failed: {err:?}"),
        }
    }
}
