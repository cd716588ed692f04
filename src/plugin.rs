//! The plug-in registration interface (spec §6 "Plug-in registration
//! interface", component I).
//!
//! This crate does not load shared objects; registration is purely
//! in-process, mirroring the teacher's own
//! `source_plugin_descriptors!`/static-descriptor idiom without the
//! `dlopen` machinery a loader binary would add on top. An embedding
//! application builds one [`PluginDescriptor`] per plug-in at process
//! start and hands it to [`StaticRegistry`]; the graph only ever sees
//! the resulting [`ComponentClassDescriptor`]s.

use crate::component::{ComponentKind, ComponentMethods};
use std::collections::HashMap;

/// A factory invoked once per `add_component` call to build the
/// user-state object for a new instance of this class.
pub type ComponentFactory = Box<dyn Fn() -> Box<dyn ComponentMethods>>;

/// The static description of one component class (spec §6: "kind, name,
/// method pointers from §4.6's table"). The "method pointers" are the
/// `ComponentMethods` implementation a `ComponentFactory` hands back.
pub struct ComponentClassDescriptor {
    pub kind: ComponentKind,
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub help: Option<&'static str>,
    pub factory: ComponentFactory,
}

/// A plug-in's static descriptor: its identity plus the component
/// classes it contributes.
pub struct PluginDescriptor {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub author: Option<&'static str>,
    pub license: Option<&'static str>,
    pub component_classes: Vec<ComponentClassDescriptor>,
}

/// An in-process registry of loaded plug-ins, keyed by plug-in name
/// then component-class name. "Loading" here means calling
/// [`StaticRegistry::register`] with a [`PluginDescriptor`] built at
/// process start; there is no discovery step.
#[derive(Default)]
pub struct StaticRegistry {
    plugins: HashMap<&'static str, PluginDescriptor>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plug-in's descriptor. Re-registering a name replaces
    /// the previous descriptor; this is a cold path, so no attempt is
    /// made to detect or reject the overwrite.
    pub fn register(&mut self, descriptor: PluginDescriptor) {
        self.plugins.insert(descriptor.name, descriptor);
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(name)
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }

    /// Finds a component-class descriptor by `(plugin_name, class_name)`
    /// across every registered plug-in.
    pub fn component_class(&self, plugin_name: &str, class_name: &str) -> Option<&ComponentClassDescriptor> {
        self.plugins
            .get(plugin_name)?
            .component_classes
            .iter()
            .find(|c| c.name == class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl ComponentMethods for Noop {}

    fn a_plugin() -> PluginDescriptor {
        PluginDescriptor {
            name: "demo",
            description: Some("a demo plug-in"),
            author: None,
            license: None,
            component_classes: vec![ComponentClassDescriptor {
                kind: ComponentKind::Sink,
                name: "printer",
                description: None,
                help: None,
                factory: Box::new(|| Box::new(Noop)),
            }],
        }
    }

    #[test]
    fn registering_a_plugin_exposes_its_component_classes() {
        let mut registry = StaticRegistry::new();
        registry.register(a_plugin());
        let class = registry.component_class("demo", "printer").unwrap();
        assert_eq!(class.kind, ComponentKind::Sink);
        assert!(registry.component_class("demo", "missing").is_none());
        assert!(registry.component_class("other", "printer").is_none());
    }

    #[test]
    fn re_registering_a_plugin_name_replaces_it() {
        let mut registry = StaticRegistry::new();
        registry.register(a_plugin());
        registry.register(PluginDescriptor {
            name: "demo",
            description: None,
            author: None,
            license: None,
            component_classes: Vec::new(),
        });
        assert!(registry.component_class("demo", "printer").is_none());
    }
}
