use wasm_bindgen::prelude::*;
use web_sys::{WebGlRenderingContext, WebGlProgram, WebGlBuffer, WebGlUniformLocation, HtmlCanvasElement, WebGlTexture, HtmlImageElement};
use nalgebra::Matrix4;
use crate::engine::mesh::{Mesh, VERTEX_STRIDE};
use wasm_bindgen::JsCast;

pub const MAX_LIGHTS: usize = 8;

const VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aColor;
    attribute vec2 aTexCoord;
    attribute vec3 aNormal;
    uniform mat4 uModel;
    uniform mat4 uViewProjection;
    uniform float uPointSize;
    varying vec3 vColor;
    varying vec2 vTexCoord;
    varying vec3 vWorldPos;
    varying vec3 vNormal;
    void main() {
        vec4 world = uModel * vec4(aPosition, 1.0);
        gl_Position = uViewProjection * world;
        gl_PointSize = uPointSize;
        vWorldPos = world.xyz;
        vNormal = (uModel * vec4(aNormal, 0.0)).xyz;
        vColor = aColor;
        vTexCoord = aTexCoord;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    #define MAX_LIGHTS 8
    varying vec3 vColor;
    varying vec2 vTexCoord;
    varying vec3 vWorldPos;
    varying vec3 vNormal;
    uniform sampler2D uTexture;
    uniform int uUseTexture;
    uniform vec3 uUniformColor;
    uniform bool uUseUniformColor;
    uniform bool uUnlit;
    uniform bool uDoubleSided;
    uniform float uOpacity;
    uniform vec3 uAmbient;
    uniform int uLightCount;
    uniform vec3 uLightPos[MAX_LIGHTS];
    uniform vec3 uLightColor[MAX_LIGHTS];
    uniform float uLightRange[MAX_LIGHTS];

    void main() {
        vec3 color;
        if (uUseUniformColor) {
            color = uUniformColor;
        } else {
            color = vColor;
        }

        if (uUseTexture == 1) {
            vec4 texColor = texture2D(uTexture, vTexCoord);
            color *= texColor.rgb;
        }

        if (!uUnlit) {
            vec3 n = normalize(vNormal);
            vec3 lit = uAmbient;
            for (int i = 0; i < MAX_LIGHTS; i++) {
                if (i >= uLightCount) break;
                vec3 toLight = uLightPos[i] - vWorldPos;
                float dist = length(toLight);
                float falloff = clamp(1.0 - dist / uLightRange[i], 0.0, 1.0);
                float facing = dot(n, toLight / max(dist, 0.0001));
                if (uDoubleSided) {
                    facing = abs(facing);
                }
                lit += uLightColor[i] * max(facing, 0.0) * falloff;
            }
            color *= lit;
        }

        gl_FragColor = vec4(color, uOpacity);
    }
"#;

/// A mesh uploaded once and drawn every frame.
pub struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    index_buffer: Option<WebGlBuffer>,
    count: i32,
}

/// How a mesh should be shaded.
#[derive(Clone, Copy)]
pub struct Material<'a> {
    pub texture: Option<&'a WebGlTexture>,
    pub color: Option<[f32; 3]>,
    pub unlit: bool,
    pub double_sided: bool,
    pub opacity: f32,
}

impl<'a> Material<'a> {
    pub fn textured(texture: Option<&'a WebGlTexture>) -> Self {
        Material { texture, color: None, unlit: false, double_sided: false, opacity: 1.0 }
    }

    pub fn solid(color: [f32; 3]) -> Self {
        Material { texture: None, color: Some(color), unlit: false, double_sided: false, opacity: 1.0 }
    }
}

pub struct Light {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub range: f32,
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    program: WebGlProgram,
    model_location: WebGlUniformLocation,
    view_projection_location: WebGlUniformLocation,
    point_size_location: WebGlUniformLocation,
    u_uniform_color_location: WebGlUniformLocation,
    u_use_uniform_color_location: WebGlUniformLocation,
    u_use_texture_location: WebGlUniformLocation,
    u_unlit_location: WebGlUniformLocation,
    u_double_sided_location: WebGlUniformLocation,
    u_opacity_location: WebGlUniformLocation,
    u_ambient_location: WebGlUniformLocation,
    u_light_count_location: WebGlUniformLocation,
    u_light_pos_location: WebGlUniformLocation,
    u_light_color_location: WebGlUniformLocation,
    u_light_range_location: WebGlUniformLocation,
    dynamic_vertex_buffer: WebGlBuffer,
}

fn uniform(gl: &WebGlRenderingContext, program: &WebGlProgram, name: &str) -> Result<WebGlUniformLocation, JsValue> {
    gl.get_uniform_location(program, name)
        .ok_or_else(|| JsValue::from_str(&format!("Failed to get {} location", name)))
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext) -> Result<Self, JsValue> {
        let program = create_program(&gl)?;
        gl.use_program(Some(&program));

        let dynamic_vertex_buffer = gl.create_buffer().ok_or("Failed to create buffer")?;

        let renderer = Renderer {
            model_location: uniform(&gl, &program, "uModel")?,
            view_projection_location: uniform(&gl, &program, "uViewProjection")?,
            point_size_location: uniform(&gl, &program, "uPointSize")?,
            u_uniform_color_location: uniform(&gl, &program, "uUniformColor")?,
            u_use_uniform_color_location: uniform(&gl, &program, "uUseUniformColor")?,
            u_use_texture_location: uniform(&gl, &program, "uUseTexture")?,
            u_unlit_location: uniform(&gl, &program, "uUnlit")?,
            u_double_sided_location: uniform(&gl, &program, "uDoubleSided")?,
            u_opacity_location: uniform(&gl, &program, "uOpacity")?,
            u_ambient_location: uniform(&gl, &program, "uAmbient")?,
            u_light_count_location: uniform(&gl, &program, "uLightCount")?,
            u_light_pos_location: uniform(&gl, &program, "uLightPos")?,
            u_light_color_location: uniform(&gl, &program, "uLightColor")?,
            u_light_range_location: uniform(&gl, &program, "uLightRange")?,
            dynamic_vertex_buffer,
            program,
            gl,
        };

        renderer.gl.uniform3f(Some(&renderer.u_ambient_location), 0.08, 0.08, 0.1);
        renderer.gl.uniform1f(Some(&renderer.point_size_location), 1.0);

        Ok(renderer)
    }

    pub fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(WebGlRenderingContext::COLOR_BUFFER_BIT | WebGlRenderingContext::DEPTH_BUFFER_BIT);
    }

    pub fn enable_depth_test(&self) {
        self.gl.enable(WebGlRenderingContext::DEPTH_TEST);
        self.gl.depth_mask(true);
    }

    /// Translucent pass: blend and stop writing depth.
    pub fn enable_blend(&self, additive: bool) {
        self.gl.enable(WebGlRenderingContext::BLEND);
        let dst = if additive { WebGlRenderingContext::ONE } else { WebGlRenderingContext::ONE_MINUS_SRC_ALPHA };
        self.gl.blend_func(WebGlRenderingContext::SRC_ALPHA, dst);
        self.gl.depth_mask(false);
    }

    pub fn disable_blend(&self) {
        self.gl.disable(WebGlRenderingContext::BLEND);
        self.gl.depth_mask(true);
    }

    /// Resizes the drawing buffer and the viewport.
    pub fn set_size(&self, width: u32, height: u32) {
        if let Some(canvas) = self.canvas() {
            canvas.set_width(width);
            canvas.set_height(height);
        }
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    pub fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.gl.canvas()?.dyn_into::<HtmlCanvasElement>().ok()
    }

    pub fn set_view_projection(&self, view_projection: &Matrix4<f32>) {
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.view_projection_location), false, view_projection.as_slice());
    }

    /// Lights past `MAX_LIGHTS` are dropped.
    pub fn set_lights(&self, lights: &[Light]) {
        let count = lights.len().min(MAX_LIGHTS);
        let mut positions = [0.0f32; MAX_LIGHTS * 3];
        let mut colors = [0.0f32; MAX_LIGHTS * 3];
        let mut ranges = [1.0f32; MAX_LIGHTS];
        for (i, light) in lights.iter().take(count).enumerate() {
            positions[i * 3..i * 3 + 3].copy_from_slice(&light.position);
            colors[i * 3..i * 3 + 3].copy_from_slice(&light.color);
            ranges[i] = light.range;
        }
        self.gl.uniform1i(Some(&self.u_light_count_location), count as i32);
        self.gl.uniform3fv_with_f32_array(Some(&self.u_light_pos_location), &positions);
        self.gl.uniform3fv_with_f32_array(Some(&self.u_light_color_location), &colors);
        self.gl.uniform1fv_with_f32_array(Some(&self.u_light_range_location), &ranges);
    }

    pub fn upload_mesh(&self, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
        let vertex_buffer = self.gl.create_buffer().ok_or("Failed to create vertex buffer")?;
        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&vertex_buffer));
        unsafe {
            let vert_array = js_sys::Float32Array::view(&mesh.vertices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                &vert_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        if mesh.indices.is_empty() {
            return Ok(GpuMesh { vertex_buffer, index_buffer: None, count: mesh.vertex_count() as i32 });
        }

        let index_buffer = self.gl.create_buffer().ok_or("Failed to create index buffer")?;
        self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        unsafe {
            let idx_array = js_sys::Uint16Array::view(&mesh.indices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ELEMENT_ARRAY_BUFFER,
                &idx_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        Ok(GpuMesh { vertex_buffer, index_buffer: Some(index_buffer), count: mesh.indices.len() as i32 })
    }

    fn bind_vertex_layout(&self, buffer: &WebGlBuffer) {
        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(buffer));

        let stride = (VERTEX_STRIDE * 4) as i32;
        let attributes = [("aPosition", 3, 0), ("aColor", 3, 12), ("aTexCoord", 2, 24), ("aNormal", 3, 32)];
        for (name, size, offset) in attributes {
            let location = self.gl.get_attrib_location(&self.program, name);
            if location < 0 {
                continue;
            }
            let location = location as u32;
            self.gl.vertex_attrib_pointer_with_i32(location, size, WebGlRenderingContext::FLOAT, false, stride, offset);
            self.gl.enable_vertex_attrib_array(location);
        }
    }

    fn apply_material(&self, material: &Material, model: &Matrix4<f32>) {
        if let Some(tex) = material.texture {
            self.gl.active_texture(WebGlRenderingContext::TEXTURE0);
            self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(tex));
            self.gl.uniform1i(Some(&self.u_use_texture_location), 1);
        } else {
            self.gl.uniform1i(Some(&self.u_use_texture_location), 0);
        }

        match material.color {
            Some([r, g, b]) => {
                self.gl.uniform1i(Some(&self.u_use_uniform_color_location), 1);
                self.gl.uniform3f(Some(&self.u_uniform_color_location), r, g, b);
            }
            None => self.gl.uniform1i(Some(&self.u_use_uniform_color_location), 0),
        }

        self.gl.uniform1i(Some(&self.u_unlit_location), material.unlit as i32);
        self.gl.uniform1i(Some(&self.u_double_sided_location), material.double_sided as i32);
        self.gl.uniform1f(Some(&self.u_opacity_location), material.opacity);
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.model_location), false, model.as_slice());
    }

    pub fn draw_mesh(&self, mesh: &GpuMesh, material: &Material, model: &Matrix4<f32>) {
        self.bind_vertex_layout(&mesh.vertex_buffer);
        self.apply_material(material, model);

        match &mesh.index_buffer {
            Some(index_buffer) => {
                self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
                self.gl.draw_elements_with_i32(
                    WebGlRenderingContext::TRIANGLES,
                    mesh.count,
                    WebGlRenderingContext::UNSIGNED_SHORT,
                    0
                );
            }
            None => self.gl.draw_arrays(WebGlRenderingContext::TRIANGLES, 0, mesh.count),
        }
    }

    pub fn draw_points(&self, points: &GpuMesh, size: f32, opacity: f32) {
        self.bind_vertex_layout(&points.vertex_buffer);
        let material = Material { texture: None, color: None, unlit: true, double_sided: false, opacity };
        self.apply_material(&material, &Matrix4::identity());
        self.gl.uniform1f(Some(&self.point_size_location), size);

        self.gl.draw_arrays(WebGlRenderingContext::POINTS, 0, points.count);
        self.gl.uniform1f(Some(&self.point_size_location), 1.0);
    }

    /// Line strip through `vertices` (xyz triples) in the frame given by `model`.
    pub fn draw_lines(&self, vertices: &[f32], color: [f32; 3], opacity: f32, model: &Matrix4<f32>) {
        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&self.dynamic_vertex_buffer));
        unsafe {
            let vert_array = js_sys::Float32Array::view(vertices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                &vert_array,
                WebGlRenderingContext::DYNAMIC_DRAW
            );
        }

        let pos_loc = self.gl.get_attrib_location(&self.program, "aPosition") as u32;
        self.gl.vertex_attrib_pointer_with_i32(pos_loc, 3, WebGlRenderingContext::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(pos_loc);
        for name in ["aColor", "aTexCoord", "aNormal"] {
            let location = self.gl.get_attrib_location(&self.program, name);
            if location >= 0 {
                self.gl.disable_vertex_attrib_array(location as u32);
            }
        }

        let material = Material { texture: None, color: Some(color), unlit: true, double_sided: false, opacity };
        self.apply_material(&material, model);

        self.gl.draw_arrays(
            WebGlRenderingContext::LINE_STRIP,
            0,
            (vertices.len() / 3) as i32
        );
    }

    /// Starts loading `url` into a texture that is white until the image arrives.
    pub fn create_texture(&self, url: &str) -> Result<WebGlTexture, JsValue> {
        let texture = self.gl.create_texture().ok_or("Failed to create texture")?;
        self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture));

        // Put a single pixel in the texture so we can use it immediately.
        let level = 0;
        let internal_format = WebGlRenderingContext::RGBA as i32;
        let width = 1;
        let height = 1;
        let border = 0;
        let src_format = WebGlRenderingContext::RGBA;
        let src_type = WebGlRenderingContext::UNSIGNED_BYTE;
        let pixel = [255u8, 255, 255, 255];
        self.gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            WebGlRenderingContext::TEXTURE_2D, level, internal_format, width, height, border, src_format, src_type, Some(&pixel)
        )?;

        let img = HtmlImageElement::new()?;
        img.set_cross_origin(Some("anonymous"));

        let gl = self.gl.clone();
        let texture_clone = texture.clone();
        let img_clone = img.clone();
        let loaded_url = url.to_string();

        let onload = Closure::wrap(Box::new(move || {
            gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture_clone));
            if let Err(err) = gl.tex_image_2d_with_u32_and_u32_and_image(
                WebGlRenderingContext::TEXTURE_2D, 0, WebGlRenderingContext::RGBA as i32, WebGlRenderingContext::RGBA, WebGlRenderingContext::UNSIGNED_BYTE, &img_clone
            ) {
                log::warn!("texture {} could not be uploaded: {:?}", loaded_url, err);
                return;
            }

            // Check if power of 2
            if is_power_of_2(img_clone.width()) && is_power_of_2(img_clone.height()) {
                gl.generate_mipmap(WebGlRenderingContext::TEXTURE_2D);
            } else {
                gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_S, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
                gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_T, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
                gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_MIN_FILTER, WebGlRenderingContext::LINEAR as i32);
            }
        }) as Box<dyn FnMut()>);

        let failed_url = url.to_string();
        let onerror = Closure::wrap(Box::new(move || {
            log::warn!("texture {} failed to load, keeping the placeholder", failed_url);
        }) as Box<dyn FnMut()>);

        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onload.forget();
        onerror.forget();

        img.set_src(url);

        Ok(texture)
    }
}

fn is_power_of_2(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

fn create_program(gl: &WebGlRenderingContext) -> Result<WebGlProgram, JsValue> {
    let vert_shader = compile_shader(gl, WebGlRenderingContext::VERTEX_SHADER, VERTEX_SHADER)?;
    let frag_shader = compile_shader(gl, WebGlRenderingContext::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or("Unable to create program")?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, WebGlRenderingContext::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(JsValue::from_str(&gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(gl: &WebGlRenderingContext, shader_type: u32, source: &str) -> Result<web_sys::WebGlShader, JsValue> {
    let shader = gl.create_shader(shader_type).ok_or("Unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, WebGlRenderingContext::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(JsValue::from_str(&gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_sizes() {
        assert!(is_power_of_2(1));
        assert!(is_power_of_2(1024));
        assert!(!is_power_of_2(0));
        assert!(!is_power_of_2(1000));
    }
}
