//! Building components by name through a plugin-defined base kind.

use cf_component::{
    Component, ComponentType, Context, Group, Handle, Kind, Library, RegistrationState,
};
use cf_options::SignalArgs;
use cf_types::{CfError, CfResult, Uri};
use std::any::Any;

// =============================================================================
// A plugin with its own trait-object base
// =============================================================================

trait Solver: Component {
    fn solve(&mut self) -> i64;
}

#[derive(Default)]
struct Ksp {
    iterations: i64,
}

impl Component for Ksp {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}

impl ComponentType for Ksp {
    const TYPE_NAME: &'static str = "cf3.solver.Ksp";
}

impl Solver for Ksp {
    fn solve(&mut self) -> i64 {
        self.iterations += 10;
        self.iterations
    }
}

#[derive(Default)]
struct Newton;

impl Component for Newton {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}

impl ComponentType for Newton {
    const TYPE_NAME: &'static str = "cf3.solver.Newton";
}

impl Solver for Newton {
    fn solve(&mut self) -> i64 {
        1
    }
}

impl Kind for dyn Solver {
    fn kind_name() -> &'static str {
        "cf3.solver.Solver"
    }

    fn downcast_ref(component: &dyn Component) -> Option<&Self> {
        let any = component as &dyn Any;
        if let Some(ksp) = any.downcast_ref::<Ksp>() {
            return Some(ksp as &dyn Solver);
        }
        any.downcast_ref::<Newton>().map(|n| n as &dyn Solver)
    }

    fn downcast_mut(component: &mut dyn Component) -> Option<&mut Self> {
        let any = component as &mut dyn Any;
        if any.is::<Ksp>() {
            return any.downcast_mut::<Ksp>().map(|k| k as &mut dyn Solver);
        }
        any.downcast_mut::<Newton>().map(|n| n as &mut dyn Solver)
    }
}

struct SolverLibrary;

impl Library for SolverLibrary {
    fn name(&self) -> &'static str {
        "cf3.solver"
    }

    fn description(&self) -> &'static str {
        "Linear and non-linear solvers"
    }

    fn register(&self, ctx: &mut Context) -> CfResult<()> {
        ctx.regist_builder::<Ksp, dyn Solver>(self.name())?;
        ctx.regist_builder::<Newton, dyn Solver>(self.name())?;
        Ok(())
    }
}

fn context() -> Context {
    let mut ctx = Context::new();
    ctx.regist_library(Box::new(SolverLibrary))
        .expect("solver library should register");
    ctx
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn build_by_name_as_plugin_base() {
    let mut ctx = context();
    let root = ctx.root();
    for type_name in ["cf3.solver.Ksp", "cf3.solver.Newton"] {
        let solver: Handle<dyn Solver> = ctx
            .create_by_name::<dyn Solver>(root, "solver", type_name)
            .expect("registered type should build");
        assert_eq!(ctx.tree.type_name(solver), Some(type_name));
        assert!(ctx.tree.get_mut(solver).is_some());
    }

    let ksp = ctx.tree.get_child(root, "solver");
    let ksp = ctx.tree.cast::<dyn Solver>(ksp);
    assert_eq!(ctx.tree[ksp].solve(), 10);
    assert_eq!(ctx.tree[ksp].solve(), 20);
}

#[test]
fn registration_state_reaches_builder_registered() {
    let ctx = context();
    assert_eq!(
        ctx.factories.registration_state::<Ksp>(),
        RegistrationState::BuilderRegistered
    );
    assert_eq!(
        ctx.factories.registration_state::<Group>(),
        RegistrationState::TypeRegistered
    );
}

#[test]
fn non_solver_cannot_be_registered_or_built_as_solver() {
    let mut ctx = context();
    assert!(matches!(
        ctx.regist_builder::<Group, dyn Solver>("cf3.common"),
        Err(CfError::CastingFailed(_))
    ));
    ctx.regist_builder::<Group, dyn Component>("cf3.common")
        .expect("group builds as a component");
    let root = ctx.root();
    assert!(matches!(
        ctx.create_by_name::<dyn Solver>(root, "g", "cf3.common.Group"),
        Err(CfError::CastingFailed(_))
    ));
    assert_eq!(ctx.tree.child_count(root), 2, "only Libraries and Factories");
}

#[test]
fn builders_and_library_are_mirrored() {
    let ctx = context();
    let root = ctx.root();
    let builder = ctx
        .tree
        .resolve(root, "/Factories/cf3.solver.Solver/cf3.solver.Newton")
        .expect("builder node should exist");
    let props = ctx.tree.properties(builder).expect("live");
    assert_eq!(props.value::<String>("library").expect("set"), "cf3.solver");

    let library = ctx
        .tree
        .resolve(root, "/Libraries/cf3.solver")
        .expect("library node should exist");
    assert_eq!(
        ctx.tree
            .properties(library)
            .expect("live")
            .value::<String>("brief")
            .expect("set"),
        "Linear and non-linear solvers"
    );
}

#[test]
fn create_component_signal_finds_plugin_builders() {
    let mut ctx = context();
    let root = ctx.root();
    let mut args = SignalArgs::new("create_component");
    args.set("name", "ksp").set("atype", "cf3.solver.Ksp");
    ctx.call_signal(root, "create_component", &mut args)
        .expect("any factory may satisfy a component request");
    let uri: Uri = args
        .reply()
        .expect("reply")
        .get("created_component")
        .expect("uri");
    assert_eq!(uri.to_string(), "cpath:/ksp");
}
