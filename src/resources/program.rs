use crate::{
    context::{ProgramDescriptor, RenderContext},
    error::RenderResult,
    pipelines::{
        VertexLayout,
        basic::{BASIC_SHADER, INSTANCED_SHADER},
        screen::SCREEN_QUAD_SHADER,
    },
    resources::ProgramId,
};

pub const DEFAULT_PROGRAM: &str = "default";
pub const INSTANCED_PROGRAM: &str = "instanced";
pub const SCREEN_QUAD_PROGRAM: &str = "screen_quad";

struct Entry<P> {
    name: String,
    layout: VertexLayout,
    program: P,
}

/// Compiles shader programs once and hands out their ids.
pub struct ProgramManager<C: RenderContext> {
    programs: Vec<Entry<C::Program>>,
}

impl<C: RenderContext> Default for ProgramManager<C> {
    fn default() -> Self {
        Self {
            programs: Vec::new(),
        }
    }
}

impl<C: RenderContext> ProgramManager<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The basic position/colour program, created on first request.
    pub fn default_program(&mut self, ctx: &mut C) -> RenderResult<ProgramId> {
        self.named_program(ctx, DEFAULT_PROGRAM, BASIC_SHADER, VertexLayout::Basic)
    }

    pub fn instanced_program(&mut self, ctx: &mut C) -> RenderResult<ProgramId> {
        self.named_program(ctx, INSTANCED_PROGRAM, INSTANCED_SHADER, VertexLayout::Instanced)
    }

    pub fn screen_quad_program(&mut self, ctx: &mut C) -> RenderResult<ProgramId> {
        self.named_program(
            ctx,
            SCREEN_QUAD_PROGRAM,
            SCREEN_QUAD_SHADER,
            VertexLayout::ScreenQuad,
        )
    }

    /// Returns the program registered as `name`, compiling `source` the first
    /// time the name is seen.
    pub fn named_program(
        &mut self,
        ctx: &mut C,
        name: &str,
        source: &str,
        layout: VertexLayout,
    ) -> RenderResult<ProgramId> {
        if let Some(i) = self.programs.iter().position(|p| p.name == name) {
            return Ok(ProgramId(i));
        }
        let program = ctx.create_program(&ProgramDescriptor {
            label: name,
            source,
            layout,
        })?;
        log::debug!("Compiled program {:?}", name);
        self.programs.push(Entry {
            name: name.to_owned(),
            layout,
            program,
        });
        Ok(ProgramId(self.programs.len() - 1))
    }

    pub fn program(&self, id: ProgramId) -> Option<&C::Program> {
        self.programs.get(id.0).map(|p| &p.program)
    }

    pub fn layout(&self, id: ProgramId) -> Option<VertexLayout> {
        self.programs.get(id.0).map(|p| p.layout)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
