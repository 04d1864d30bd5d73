//! Signals every component answers unless it registers its own.

use crate::{AnyHandle, Component, Context, SignalRegistry};
use cf_options::SignalArgs;
use cf_types::{CfResult, Uri, Value, ValueType};

pub(crate) fn default_signals() -> SignalRegistry {
    let mut signals = SignalRegistry::new();

    signals
        .regist_signal("create_component")
        .with_description("Create a child component by type name")
        .with_pretty_name("Create component")
        .with_signature(|args| {
            args.set("name", "");
            args.set("atype", "");
        })
        .connect(create_component);

    signals
        .regist_signal("delete_component")
        .with_description("Delete this component and its children")
        .with_pretty_name("Delete component")
        .connect(|ctx, this, _| ctx.tree.remove_component(this));

    signals
        .regist_signal("move_component")
        .with_description("Move this component under another parent")
        .with_pretty_name("Move component")
        .with_signature(|args| {
            args.set("path", ValueType::Uri.default_value());
        })
        .connect(|ctx, this, args| {
            let path: Uri = args.get("path")?;
            let parent = ctx.tree.access_component(this, &path)?;
            ctx.tree.move_to(this, parent)
        });

    signals
        .regist_signal("rename_component")
        .with_description("Rename this component")
        .with_pretty_name("Rename component")
        .with_signature(|args| {
            args.set("name", "");
        })
        .connect(|ctx, this, args| {
            let name: String = args.get("name")?;
            let given = ctx.tree.rename_component(this, &name)?;
            args.create_reply().set("name", given);
            Ok(())
        });

    signals
        .regist_signal("configure")
        .with_description("Set options from the frame arguments")
        .connect(|ctx, this, args| ctx.tree.options_mut(this)?.configure(&args.options));

    signals
        .regist_signal("list_tree")
        .with_description("Text listing of this subtree")
        .with_pretty_name("List tree")
        .read_only()
        .connect(|ctx, this, args| {
            let listing = ctx.tree.tree_listing(this)?;
            args.create_reply().set("tree", listing);
            Ok(())
        });

    signals
        .regist_signal("list_options")
        .with_description("Options as name:type=value strings")
        .with_pretty_name("List options")
        .read_only()
        .connect(|ctx, this, args| {
            let options: Vec<String> = ctx
                .tree
                .options(this)?
                .iter()
                .map(|o| format!("{}:{}={}", o.name(), o.value_type(), o.value()))
                .collect();
            args.create_reply().set("options", options);
            Ok(())
        });

    signals
        .regist_signal("list_properties")
        .with_description("Properties as reply arguments")
        .with_pretty_name("List properties")
        .read_only()
        .connect(|ctx, this, args| {
            let properties: Vec<(String, Value)> = ctx
                .tree
                .properties(this)?
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect();
            let reply = args.create_reply();
            for (name, value) in properties {
                reply.set(&name, value);
            }
            Ok(())
        });

    signals
        .regist_signal("list_signals")
        .with_description("Names of the signals this component answers")
        .with_pretty_name("List signals")
        .read_only()
        .connect(|ctx, this, args| {
            let names: Vec<String> = ctx
                .list_signals(this)?
                .into_iter()
                .filter(|s| !s.is_hidden())
                .map(|s| s.name().to_string())
                .collect();
            args.create_reply().set("signals", names);
            Ok(())
        });

    signals
        .regist_signal("signature")
        .with_description("Arguments expected by another signal")
        .hidden()
        .read_only()
        .with_signature(|args| {
            args.set("name", "");
        })
        .connect(|ctx, this, args| {
            let name: String = args.get("name")?;
            let frame = ctx.signature(this, &name)?;
            args.create_reply().options = frame.options;
            Ok(())
        });

    signals
}

fn create_component(
    ctx: &mut Context,
    this: AnyHandle,
    args: &mut SignalArgs,
) -> CfResult<()> {
    let name: String = args.get("name")?;
    let atype: String = args.get("atype")?;
    let created = ctx.create_by_name::<dyn Component>(this, &name, &atype)?;
    let uri = ctx.tree.uri(created)?;
    args.create_reply().set("created_component", uri);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::testing::Gauge;
    use crate::{Component, Context, Group, Link};
    use cf_options::SignalArgs;
    use cf_types::{CfError, Uri};

    fn context() -> Context {
        let mut ctx = Context::new();
        ctx.regist_builder::<Group, dyn Component>("cf3.common")
            .expect("group builder");
        ctx.regist_builder::<Link, dyn Component>("cf3.common")
            .expect("link builder");
        ctx
    }

    #[test]
    fn create_component_replies_with_uri() {
        let mut ctx = context();
        let root = ctx.root();
        let mut args = SignalArgs::new("create_component");
        args.set("name", "World").set("atype", "cf3.common.Group");
        ctx.call_signal(root, "create_component", &mut args)
            .expect("create should succeed");

        let reply = args.reply().expect("reply");
        let uri: Uri = reply.get("created_component").expect("uri");
        assert_eq!(uri.to_string(), "cpath:/World");
        let created = ctx.tree.get_child(root, "World");
        assert_eq!(ctx.tree.type_name(created), Some("cf3.common.Group"));
    }

    #[test]
    fn create_component_with_unknown_type_fails() {
        let mut ctx = context();
        let root = ctx.root();
        let mut args = SignalArgs::new("create_component");
        args.set("name", "x").set("atype", "cf3.nope.Nope");
        assert!(matches!(
            ctx.call_signal(root, "create_component", &mut args),
            Err(CfError::ValueNotFound(_))
        ));
    }

    #[test]
    fn move_rename_delete() {
        let mut ctx = context();
        let root = ctx.root();
        let a = ctx.create_component::<Group>(root, "a").expect("created");
        let b = ctx.create_component::<Group>(root, "b").expect("created");

        let mut args = SignalArgs::new("move_component");
        args.set("path", Uri::cpath("/b"));
        ctx.call_signal(a, "move_component", &mut args).expect("moved");
        assert_eq!(ctx.tree.parent(a), b);

        let mut args = SignalArgs::new("rename_component");
        args.set("name", "renamed");
        ctx.call_signal(a, "rename_component", &mut args).expect("renamed");
        assert_eq!(
            ctx.tree.uri(a).expect("live").to_string(),
            "cpath:/b/renamed"
        );

        let mut args = SignalArgs::default();
        ctx.call_signal(b, "delete_component", &mut args).expect("deleted");
        assert!(ctx.tree.is_null(a));
    }

    #[test]
    fn configure_and_list_options() {
        let mut ctx = context();
        let root = ctx.root();
        let gauge = ctx.create_component::<Gauge>(root, "gauge").expect("created");

        let mut args = SignalArgs::new("configure");
        args.set("level", 4i64);
        ctx.call_signal(gauge, "configure", &mut args).expect("configured");
        assert_eq!(ctx.tree[gauge].level(), 4);

        let mut args = SignalArgs::default();
        ctx.call_signal(gauge, "list_options", &mut args).expect("listed");
        let options: Vec<String> = args.reply().expect("reply").get("options").expect("list");
        assert_eq!(options, vec!["level:integer=4"]);
    }

    #[test]
    fn listings_reply() {
        let mut ctx = context();
        let root = ctx.root();
        let gauge = ctx.create_component::<Gauge>(root, "gauge").expect("created");

        let mut args = SignalArgs::default();
        ctx.call_signal(gauge, "list_signals", &mut args).expect("listed");
        let signals: Vec<String> = args.reply().expect("reply").get("signals").expect("list");
        assert_eq!(signals.first().map(String::as_str), Some("poke"));
        assert!(!signals.iter().any(|s| s == "signature"));

        let mut args = SignalArgs::default();
        ctx.call_signal(gauge, "list_properties", &mut args).expect("listed");
        assert!(args.reply().expect("reply").contains("brief"));

        let mut args = SignalArgs::default();
        ctx.call_signal(root, "list_tree", &mut args).expect("listed");
        let tree: String = args.reply().expect("reply").get("tree").expect("text");
        assert!(tree.contains("gauge (cf3.testing.Gauge)"));
    }

    #[test]
    fn signature_signal_describes_arguments() {
        let mut ctx = context();
        let root = ctx.root();
        let mut args = SignalArgs::default();
        args.set("name", "create_component");
        ctx.call_signal(root, "signature", &mut args).expect("described");
        let reply = args.reply().expect("reply");
        assert!(reply.contains("name"));
        assert!(reply.contains("atype"));
    }

    #[test]
    fn static_components_refuse_deletion() {
        let mut ctx = context();
        let libraries = ctx.tree.get_child(ctx.root(), "Libraries");
        let mut args = SignalArgs::default();
        assert!(matches!(
            ctx.call_signal(libraries, "delete_component", &mut args),
            Err(CfError::NotSupported(_))
        ));
    }
}
