//! Static hoisting.
//!
//! Constant subtrees are moved out of the render function into the root's
//! hoists list and referenced by index, so they are created once and reused
//! on every render.

use crate::ast::{CompoundChild, ConstantType, RootNode};
use crate::helpers::RuntimeHelper;
use crate::js::{ArrayExpression, JsChildNode, NodeId, PatchFlags, VNodeCall, VNodeChildren, VNodeTag};
use rustc_hash::FxHashMap;

/// Hoist constant subtrees of the root's codegen tree. Returns the number of
/// hoists added.
pub fn hoist_static(root: &mut RootNode) -> usize {
    let before = root.hoists.len();
    let Some(node) = root.codegen_node.as_mut() else {
        return 0;
    };
    let mut hoister = Hoister {
        hoists: &mut root.hoists,
        memo: FxHashMap::default(),
    };

    // A root fragment is never a candidate, only its children are.
    if hoister.is_hoistable(node) {
        hoister.hoist(node);
    } else {
        hoister.walk(node);
    }

    let added = root.hoists.len() - before;
    tracing::debug!(hoists = added, "hoisted static nodes");
    added
}

struct Hoister<'a> {
    hoists: &'a mut Vec<JsChildNode>,
    memo: FxHashMap<NodeId, ConstantType>,
}

impl Hoister<'_> {
    fn hoist(&mut self, node: &mut JsChildNode) {
        let index = self.hoists.len();
        let mut hoisted = std::mem::replace(node, JsChildNode::Hoisted(index));
        if let JsChildNode::VNodeCall(call) = &mut hoisted {
            call.patch_flag = PatchFlags::HOISTED;
            call.is_block = false;
        }
        self.hoists.push(hoisted);
    }

    fn push(&mut self, node: JsChildNode) -> usize {
        self.hoists.push(node);
        self.hoists.len() - 1
    }

    /// Plain elements and text calls at hoistable level or better.
    fn is_hoistable(&mut self, node: &JsChildNode) -> bool {
        let candidate = match node {
            JsChildNode::VNodeCall(call) => !call.is_fragment() && !call.is_component,
            JsChildNode::TextCall(_) => true,
            _ => false,
        };
        candidate && self.level(node) >= ConstantType::CanHoist
    }

    /// Descend into a node that is not itself a hoist candidate.
    fn walk(&mut self, node: &mut JsChildNode) {
        match node {
            JsChildNode::VNodeCall(call) => self.walk_vnode(call),
            JsChildNode::Conditional(cond) => {
                self.walk(&mut cond.consequent);
                self.walk(&mut cond.alternate);
            }
            JsChildNode::Call(call) => call.args.iter_mut().for_each(|arg| self.walk(arg)),
            JsChildNode::Function(function) => match &mut function.returns {
                Some(JsChildNode::Array(array)) => self.walk_list(&mut array.elements),
                Some(returns) => self.walk(returns),
                None => {}
            },
            JsChildNode::Object(object) => object.properties.iter_mut().for_each(|p| self.walk(&mut p.value)),
            JsChildNode::Array(array) => array.elements.iter_mut().for_each(|e| self.walk(e)),
            _ => {}
        }
    }

    fn walk_vnode(&mut self, call: &mut VNodeCall) {
        match &mut call.children {
            Some(VNodeChildren::Nodes(children)) => {
                self.walk_list(children);
                let plain = matches!(call.tag, VNodeTag::Literal(_)) && !call.is_component;
                if plain && !children.is_empty() && children.iter().all(|c| matches!(c, JsChildNode::Hoisted(_))) {
                    let elements = std::mem::take(children);
                    let index = self.push(JsChildNode::Array(ArrayExpression { elements }));
                    call.children = Some(VNodeChildren::Hoisted(index));
                }
            }
            Some(VNodeChildren::Slots(slots)) => self.walk(slots),
            Some(VNodeChildren::RenderList(list)) => self.walk(list),
            _ => {}
        }
    }

    /// Children of a vnode or slot body. Maximal constant children are
    /// hoisted whole; the rest are descended into.
    fn walk_list(&mut self, children: &mut [JsChildNode]) {
        for child in children.iter_mut() {
            if self.is_hoistable(child) {
                self.hoist(child);
                continue;
            }
            if let JsChildNode::VNodeCall(call) = child {
                self.hoist_props(call);
            }
            self.walk(child);
        }
    }

    /// Hoist the props object of an element that cannot be hoisted whole.
    fn hoist_props(&mut self, call: &mut VNodeCall) {
        if call.is_component || !matches!(call.tag, VNodeTag::Literal(_)) {
            return;
        }
        let flag = call.patch_flag;
        if !(flag.is_empty() || flag == PatchFlags::NEED_PATCH || flag == PatchFlags::TEXT) {
            return;
        }
        let constant = match &call.props {
            Some(props @ JsChildNode::Object(_)) => self.level(props) >= ConstantType::CanHoist,
            _ => false,
        };
        if constant {
            if let Some(props) = call.props.take() {
                let index = self.push(props);
                call.props = Some(JsChildNode::Hoisted(index));
            }
        }
    }

    fn level(&mut self, node: &JsChildNode) -> ConstantType {
        match node {
            JsChildNode::VNodeCall(call) => {
                if let Some(level) = self.memo.get(&call.id) {
                    return *level;
                }
                let level = self.element_level(call);
                self.memo.insert(call.id, level);
                level
            }
            JsChildNode::TextCall(call) => match &call.content {
                Some(content) => self.level(content),
                None => ConstantType::CanStringify,
            },
            JsChildNode::Text(_) | JsChildNode::Comment(_) => ConstantType::CanStringify,
            JsChildNode::Interpolation(_) => ConstantType::NotConstant,
            JsChildNode::Simple(s) => s.const_type,
            JsChildNode::Compound(c) => {
                if c.children.iter().any(|child| matches!(child, CompoundChild::Interpolation(_))) {
                    ConstantType::NotConstant
                } else {
                    c.const_type
                }
            }
            JsChildNode::Hoisted(_) => ConstantType::CanHoist,
            JsChildNode::Object(object) => {
                let mut level = ConstantType::CanStringify;
                for prop in &object.properties {
                    if prop.static_key().is_none() {
                        return ConstantType::NotConstant;
                    }
                    level = level.min(self.level(&prop.value));
                }
                level
            }
            JsChildNode::Array(array) => array
                .elements
                .iter()
                .fold(ConstantType::CanStringify, |level, e| level.min(self.level(e))),
            // Normalizers over a constant argument stay constant.
            JsChildNode::Call(call) if is_normalizer(call.callee) => match call.args.first() {
                Some(arg) => self.level(arg),
                None => ConstantType::NotConstant,
            },
            _ => ConstantType::NotConstant,
        }
    }

    fn element_level(&mut self, call: &VNodeCall) -> ConstantType {
        let VNodeTag::Literal(tag) = &call.tag else {
            return ConstantType::NotConstant;
        };
        if call.is_component {
            return ConstantType::NotConstant;
        }
        if call.is_block && !matches!(tag.as_str(), "svg" | "foreignObject" | "math") {
            return ConstantType::NotConstant;
        }
        if !call.patch_flag.is_empty() || call.directives.is_some() {
            return ConstantType::NotConstant;
        }

        let mut level = ConstantType::CanStringify;
        if let Some(props) = &call.props {
            level = level.min(self.level(props));
        }
        match &call.children {
            None => {}
            Some(VNodeChildren::Nodes(children)) => {
                for child in children {
                    level = level.min(self.level(child));
                    if level == ConstantType::NotConstant {
                        break;
                    }
                }
            }
            Some(VNodeChildren::Single(child)) => level = level.min(self.level(child)),
            Some(VNodeChildren::Hoisted(_)) => level = level.min(ConstantType::CanHoist),
            Some(VNodeChildren::Slots(_) | VNodeChildren::RenderList(_)) => return ConstantType::NotConstant,
        }
        level
    }
}

fn is_normalizer(callee: RuntimeHelper) -> bool {
    matches!(
        callee,
        RuntimeHelper::NORMALIZE_CLASS
            | RuntimeHelper::NORMALIZE_STYLE
            | RuntimeHelper::NORMALIZE_PROPS
            | RuntimeHelper::GUARD_REACTIVE_PROPS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompilerOptions;
    use crate::parser::parse;
    use crate::transform::transform;
    use pretty_assertions::assert_eq;

    fn hoisted(source: &str) -> RootNode {
        let options = CompilerOptions::default();
        let (mut root, _) = parse(source, &options);
        transform(&mut root, &options);
        hoist_static(&mut root);
        root
    }

    fn root_call(root: &RootNode) -> &VNodeCall {
        root.codegen_node
            .as_ref()
            .and_then(JsChildNode::as_vnode_call)
            .expect("vnode root")
    }

    #[test]
    fn test_static_root_is_hoisted() {
        let root = hoisted("<div>Hello World</div>");
        assert_eq!(root.codegen_node, Some(JsChildNode::Hoisted(0)));
        assert_eq!(root.hoists.len(), 1);
        let call = root.hoists[0].as_vnode_call().expect("hoisted vnode");
        assert_eq!(call.patch_flag, PatchFlags::HOISTED);
    }

    #[test]
    fn test_fragment_root_stays_block() {
        let root = hoisted("<p>a</p><p>{{ msg }}</p>");
        let call = root_call(&root);
        assert!(call.is_fragment());
        match &call.children {
            Some(VNodeChildren::Nodes(children)) => {
                assert_eq!(children[0], JsChildNode::Hoisted(0));
                assert!(matches!(children[1], JsChildNode::VNodeCall(_)));
            }
            other => panic!("expected children, got {:?}", other),
        }
        assert_eq!(root.hoists.len(), 1);
    }

    #[test]
    fn test_interpolation_blocks_ancestors() {
        let root = hoisted("<div><section><p><span>{{ msg }}</span></p></section><i>static</i></div>");
        let call = root_call(&root);
        match &call.children {
            Some(VNodeChildren::Nodes(children)) => {
                assert!(matches!(children[0], JsChildNode::VNodeCall(_)));
                assert_eq!(children[1], JsChildNode::Hoisted(0));
            }
            other => panic!("expected children, got {:?}", other),
        }
        assert_eq!(root.hoists.len(), 1);
    }

    #[test]
    fn test_all_static_children_hoisted_as_array() {
        let root = hoisted(r#"<div :id="id"><span>a</span><span>b</span></div>"#);
        let call = root_call(&root);
        assert_eq!(call.children, Some(VNodeChildren::Hoisted(2)));
        assert!(matches!(&root.hoists[2], JsChildNode::Array(a) if a.elements.len() == 2));
    }

    #[test]
    fn test_constant_props_hoisted() {
        let root = hoisted(r#"<div><p class="title">{{ msg }}</p></div>"#);
        let call = root_call(&root);
        let Some(VNodeChildren::Nodes(children)) = &call.children else {
            panic!("expected children");
        };
        let p = children[0].as_vnode_call().expect("p");
        assert_eq!(p.props, Some(JsChildNode::Hoisted(0)));
        assert_eq!(p.patch_flag, PatchFlags::TEXT);
    }

    #[test]
    fn test_components_and_branches_not_hoisted() {
        let root = hoisted("<div><Foo/></div>");
        assert!(root.hoists.is_empty());

        let root = hoisted(r#"<div v-if="ok">static</div>"#);
        assert!(root.hoists.is_empty());
        assert!(matches!(root.codegen_node, Some(JsChildNode::Conditional(_))));
    }

    #[test]
    fn test_iteration_body_not_hoisted_but_inner_content_is() {
        let root = hoisted(r#"<li v-for="i in items" :key="i"><b>x</b></li>"#);
        // `<b>` and then the children array of `<li>`.
        assert_eq!(root.hoists.len(), 2);
        assert!(matches!(root.hoists[1], JsChildNode::Array(_)));
        assert!(matches!(root.codegen_node, Some(JsChildNode::VNodeCall(_))));
    }

    #[test]
    fn test_slot_content_hoisted() {
        let root = hoisted("<Foo><span>static</span></Foo>");
        assert_eq!(root.hoists.len(), 1);
    }
}
