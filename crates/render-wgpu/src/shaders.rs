/// Shared per-frame uniforms. Mirrors `gpu::Globals`.
const GLOBALS: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    globe: mat4x4<f32>,
    // rgb = ambient color * intensity, w = number of point lights
    ambient: vec4<f32>,
    light_pos: array<vec4<f32>, 3>,
    light_color: array<vec4<f32>, 3>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;
"#;

/// Textured, lit base sphere. Rotates with the globe.
pub const GLOBE_SHADER: &str = r#"
@group(1) @binding(0)
var surface_texture: texture_2d<f32>;
@group(1) @binding(1)
var surface_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_globe(vertex: VertexInput) -> VertexOutput {
    let world_pos = globals.globe * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((globals.globe * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_globe(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(surface_texture, surface_sampler, in.uv).rgb;
    let n = normalize(in.world_normal);
    var light = globals.ambient.rgb;
    let count = u32(globals.ambient.w);
    for (var i = 0u; i < count; i = i + 1u) {
        let dir = normalize(globals.light_pos[i].xyz - in.world_pos);
        light = light + globals.light_color[i].rgb * max(dot(n, dir), 0.0);
    }
    return vec4<f32>(base * light, 1.0);
}
"#;

/// Rim-lit shell: `intensity = max(c - dot(N, V), 0)^p` with `V` the view
/// axis. Used for both the glow and the atmosphere; only culling differs.
pub const RIM_SHADER: &str = r#"
struct Rim {
    color: vec4<f32>,
    // x = c, y = p, z = alpha scale
    params: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> rim: Rim;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) view_normal: vec3<f32>,
};

@vertex
fn vs_rim(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = globals.view_proj * vec4<f32>(vertex.position, 1.0);
    out.view_normal = normalize((globals.view * vec4<f32>(vertex.normal, 0.0)).xyz);
    return out;
}

@fragment
fn fs_rim(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = max(rim.params.x - dot(normalize(in.view_normal), vec3<f32>(0.0, 0.0, 1.0)), 0.0);
    let intensity = pow(base, rim.params.y);
    return vec4<f32>(rim.color.rgb, intensity * rim.params.z);
}
"#;

/// Unlit instanced geometry: marker dots, halos, rings, beams, the
/// wireframe shell and the star points.
pub const UNLIT_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
};

struct InstanceInput {
    @location(1) model_0: vec4<f32>,
    @location(2) model_1: vec4<f32>,
    @location(3) model_2: vec4<f32>,
    @location(4) model_3: vec4<f32>,
    @location(5) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_unlit(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: VertexOutput;
    out.clip_position = globals.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_unlit(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Prefix a shader body with the shared uniform block.
pub fn with_globals(body: &str) -> String {
    format!("{GLOBALS}\n{body}")
}
