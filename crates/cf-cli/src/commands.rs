//! One function per subcommand. Each returns the text to print.

use cf_component::Context;
use cf_options::{Assignment, SignalArgs};
use cf_types::CfResult;
use std::fmt::Write as _;

/// `cf3 tree [path]`
pub fn tree(ctx: &Context, path: &str) -> CfResult<String> {
    let from = ctx.tree.resolve(ctx.root(), path)?;
    ctx.tree.tree_listing(from)
}

/// `cf3 types`: factories with their builders, then every known type.
pub fn types(ctx: &Context) -> String {
    let mut out = String::new();
    for factory in ctx.factories.iter() {
        let _ = writeln!(out, "{}", factory.base_name());
        for builder in factory.builders() {
            let _ = writeln!(out, "  {} [{}]", builder.type_name(), builder.library());
        }
    }
    let _ = writeln!(out, "types:");
    for entry in ctx.factories.types().iter() {
        let _ = writeln!(out, "  {}", entry.type_name);
    }
    out
}

/// `cf3 options <path>`: one `name:type=value` line per option.
pub fn options(ctx: &Context, path: &str) -> CfResult<String> {
    let handle = ctx.tree.resolve(ctx.root(), path)?;
    let mut out = String::new();
    for option in ctx.tree.options(handle)?.iter() {
        let _ = writeln!(
            out,
            "{}:{}={}",
            option.name(),
            option.value_type(),
            option.value()
        );
    }
    Ok(out)
}

/// `cf3 signals <path>`: visible signals with their descriptions.
pub fn signals(ctx: &Context, path: &str) -> CfResult<String> {
    let handle = ctx.tree.resolve(ctx.root(), path)?;
    let mut out = String::new();
    for signal in ctx.list_signals(handle)? {
        if signal.is_hidden() {
            continue;
        }
        if signal.description().is_empty() {
            let _ = writeln!(out, "{}", signal.name());
        } else {
            let _ = writeln!(out, "{:<20} {}", signal.name(), signal.description());
        }
    }
    Ok(out)
}

/// `cf3 call <path> <signal> [name[:type]=value ...]`
///
/// Untyped arguments are parsed with the type the signal's signature
/// declares. Returns the reply frame as JSON, if the signal replied.
pub fn call<S: AsRef<str>>(
    ctx: &mut Context,
    path: &str,
    signal: &str,
    args: &[S],
) -> CfResult<Option<String>> {
    let handle = ctx.tree.resolve(ctx.root(), path)?;
    let mut frame: SignalArgs = ctx.signature(handle, signal)?;
    for assignment in Assignment::parse_all(args)? {
        match assignment.value_type {
            Some(_) => {
                frame.set(&assignment.name, assignment.value()?);
            }
            None => assignment.apply_to(&mut frame.options)?,
        }
    }

    ctx.call_signal(handle, signal, &mut frame)?;
    frame.reply().map(|reply| reply.to_json()).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldLibrary;
    use cf_runtime::{config::CoreConfig, Core, PluginCatalog};
    use cf_types::CfError;

    fn core() -> Core {
        let catalog = PluginCatalog::new()
            .with(WorldLibrary::NAME, || Box::new(WorldLibrary))
            .expect("unique name");
        let config = CoreConfig {
            plugins: vec![WorldLibrary::NAME.into()],
            ..CoreConfig::default()
        };
        let mut core = Core::with_catalog(config, catalog).expect("core should build");
        core.initiate::<&str>(&[]).expect("core should start");
        core
    }

    #[test]
    fn tree_lists_subtree() {
        let core = core();
        let listing = tree(core.context(), "/World/Europe").expect("path exists");
        assert!(listing.starts_with("Europe (cf3.common.Group)"));
        assert!(listing.contains("  Belgium (cf3.common.Group)"));
    }

    #[test]
    fn tree_of_missing_path_fails() {
        let core = core();
        assert!(matches!(
            tree(core.context(), "/World/Asia"),
            Err(CfError::ValueNotFound(_))
        ));
    }

    #[test]
    fn types_lists_common_builders() {
        let core = core();
        let text = types(core.context());
        assert!(text.contains("cf3.common.Component"));
        assert!(text.contains("  cf3.common.Link [cf3.common]"));
        assert!(text.contains("  cf3.common.Environment"));
    }

    #[test]
    fn options_of_environment() {
        let core = core();
        let text = options(core.context(), "/Environment").expect("environment exists");
        assert!(text.contains("log_level:string=warn"));
        assert!(text.contains("regist_signal_handlers:bool=false"));
    }

    #[test]
    fn signals_hide_hidden_ones() {
        let core = core();
        let text = signals(core.context(), "/World/Current_Country").expect("link exists");
        assert!(text.contains("change_link"));
        assert!(text.contains("create_component"));
        assert!(!text.lines().any(|l| l.starts_with("signature")));
    }

    #[test]
    fn call_with_untyped_argument_uses_signature() {
        let mut core = core();
        let reply = call(
            core.context_mut(),
            "/World",
            "create_component",
            &["name=Asia", "atype=cf3.common.Group"],
        )
        .expect("signature declares both arguments");
        let reply = reply.expect("create_component replies");
        assert!(reply.contains("cpath:/World/Asia"));
        assert!(tree(core.context(), "/World/Asia").is_ok());
    }

    #[test]
    fn call_unknown_signal_fails() {
        let mut core = core();
        let err = call::<&str>(core.context_mut(), "/World", "explode", &[])
            .expect_err("no such signal");
        assert!(matches!(err, CfError::ValueNotFound(_)));
    }
}
