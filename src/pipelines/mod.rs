//! Shader programs and the vertex layouts they expect.
//!
//! Every program reads vertex attributes from separate buffers, one attribute
//! per slot:
//!
//! | slot | attribute | format | step |
//! |------|-----------|--------|------|
//! | 0 | position | `Float32x3` | vertex |
//! | 1 | texCoords | `Float32x2` | vertex |
//! | 2 | color | `Float32x4` | vertex |
//! | 3 | instancedPosition | `Float32x3` | instance |
//! | 4 | instancedColor | `Float32x4` | instance |
//! | 5 | instancedRadius | `Float32` | instance |
//!
//! The screen quad program only uses slots 0 and 1.

pub mod basic;
pub mod screen;

use crate::data_structures::{mesh::AttributeId, texture::Texture};

const POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const TEX_COORDS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];
const COLOR: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x4];
const INSTANCED_POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x3];
const INSTANCED_COLOR: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Float32x4];
const INSTANCED_RADIUS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![5 => Float32];

/// Vertex input shape of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// position, texCoords, color
    Basic,
    /// `Basic` plus the three per-instance attributes
    Instanced,
    /// position, texCoords; samples an off-screen texture at group 1
    ScreenQuad,
}

impl VertexLayout {
    /// Attributes in slot order.
    pub fn attributes(self) -> &'static [AttributeId] {
        const ALL: [AttributeId; 6] = [
            AttributeId::Vertices,
            AttributeId::TexCoords,
            AttributeId::Color,
            AttributeId::InstancedPosition,
            AttributeId::InstancedColor,
            AttributeId::InstancedRadius,
        ];
        match self {
            VertexLayout::Basic => &ALL[..3],
            VertexLayout::Instanced => &ALL,
            VertexLayout::ScreenQuad => &ALL[..2],
        }
    }

    pub fn samples_texture(self) -> bool {
        matches!(self, VertexLayout::ScreenQuad)
    }

    pub fn buffers(self) -> Vec<wgpu::VertexBufferLayout<'static>> {
        self.attributes()
            .iter()
            .map(|&attribute| buffer_layout(attribute))
            .collect()
    }
}

fn buffer_layout(attribute: AttributeId) -> wgpu::VertexBufferLayout<'static> {
    let attributes: &'static [wgpu::VertexAttribute] = match attribute {
        AttributeId::Vertices => &POSITION,
        AttributeId::TexCoords => &TEX_COORDS,
        AttributeId::Color => &COLOR,
        AttributeId::InstancedPosition => &INSTANCED_POSITION,
        AttributeId::InstancedColor => &INSTANCED_COLOR,
        AttributeId::InstancedRadius => &INSTANCED_RADIUS,
    };
    wgpu::VertexBufferLayout {
        array_stride: (attribute.width() * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
        step_mode: if attribute.is_instanced() {
            wgpu::VertexStepMode::Instance
        } else {
            wgpu::VertexStepMode::Vertex
        },
        attributes,
    }
}

/// Builds a render pipeline for one program/topology/depth combination.
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    topology: wgpu::PrimitiveTopology,
    depth_test: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // planes are seen from both sides
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: depth_test,
            depth_compare: if depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
        cache: None,
    })
}
