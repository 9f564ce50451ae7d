//! Programs for scene meshes.

/// Position/colour shader used by triangle and line meshes.
pub const BASIC_SHADER: &str = include_str!("basic.wgsl");

/// Stamps the base shape at every instance position, scaled by the instance
/// radius and tinted with the instance colour.
pub const INSTANCED_SHADER: &str = include_str!("instanced.wgsl");

pub const BLEND: wgpu::BlendState = wgpu::BlendState::ALPHA_BLENDING;

/// Bind group layout for the per-draw [`DrawUniforms`](crate::context::DrawUniforms),
/// addressed with a dynamic offset.
pub fn uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("draw_uniform_bind_group_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<crate::context::DrawUniforms>() as u64,
                ),
            },
            count: None,
        }],
    })
}
