//! Block flattening.
//!
//! Every block root records the dynamic nodes beneath it, so the renderer
//! can patch a block by walking a flat list instead of the whole subtree.
//! Nested blocks are recorded as a single entry; their interior belongs to
//! their own list.

use crate::ast::RootNode;
use crate::helpers::RuntimeHelper;
use crate::js::{JsChildNode, NodeId, VNodeCall, VNodeChildren};

/// A block root and the dynamic descendants it tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockSummary {
    pub id: NodeId,
    pub tag: String,
    pub dynamic_children: Vec<NodeId>,
}

/// Fill `dynamic_children` on every block root of the codegen tree. The
/// template root, when it is a vnode, becomes a block.
pub fn flatten_blocks(root: &mut RootNode) -> Vec<BlockSummary> {
    let mut flattener = Flattener::default();
    if let Some(node) = root.codegen_node.as_mut() {
        if let JsChildNode::VNodeCall(call) = node {
            call.is_block = true;
        }
        flattener.frames.push(Vec::new());
        flattener.visit(node);
    }
    tracing::debug!(blocks = flattener.blocks.len(), "flattened blocks");
    flattener.blocks
}

#[derive(Default)]
struct Flattener {
    frames: Vec<Vec<NodeId>>,
    blocks: Vec<BlockSummary>,
}

impl Flattener {
    fn track(&mut self, id: NodeId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(id);
        }
    }

    fn visit(&mut self, node: &mut JsChildNode) {
        match node {
            JsChildNode::VNodeCall(call) => self.visit_vnode(call),
            JsChildNode::TextCall(call) => {
                if call.patch_flag.is_dynamic() {
                    self.track(call.id);
                }
            }
            JsChildNode::Conditional(cond) => {
                self.visit(&mut cond.test);
                self.visit(&mut cond.consequent);
                self.visit(&mut cond.alternate);
            }
            JsChildNode::Function(function) => {
                let Some(returns) = function.returns.as_mut() else {
                    return;
                };
                if function.is_slot {
                    // Slot content is patched by the component rendering it.
                    self.frames.push(Vec::new());
                    self.visit(returns);
                    self.frames.pop();
                } else {
                    self.visit(returns);
                }
            }
            // The outlet renders its own fragment block at runtime.
            JsChildNode::Call(call) if call.callee == RuntimeHelper::RENDER_SLOT => {
                self.frames.push(Vec::new());
                call.args.iter_mut().for_each(|arg| self.visit(arg));
                self.frames.pop();
            }
            JsChildNode::Call(call) => call.args.iter_mut().for_each(|arg| self.visit(arg)),
            JsChildNode::Object(object) => object.properties.iter_mut().for_each(|p| self.visit(&mut p.value)),
            JsChildNode::Array(array) => array.elements.iter_mut().for_each(|e| self.visit(e)),
            _ => {}
        }
    }

    fn visit_vnode(&mut self, call: &mut VNodeCall) {
        if !call.is_block {
            if call.patch_flag.is_dynamic() {
                self.track(call.id);
            }
            self.visit_children(call);
            return;
        }

        self.track(call.id);
        let slot = self.blocks.len();
        self.blocks.push(BlockSummary {
            id: call.id,
            tag: call.tag_name(),
            dynamic_children: Vec::new(),
        });
        self.frames.push(Vec::new());
        self.visit_children(call);
        let dynamic_children = self.frames.pop().unwrap_or_default();
        self.blocks[slot].dynamic_children = dynamic_children.clone();
        call.dynamic_children = dynamic_children;
    }

    fn visit_children(&mut self, call: &mut VNodeCall) {
        match &mut call.children {
            Some(VNodeChildren::Nodes(children)) => children.iter_mut().for_each(|c| self.visit(c)),
            Some(VNodeChildren::Single(child) | VNodeChildren::Slots(child) | VNodeChildren::RenderList(child)) => {
                self.visit(child)
            }
            Some(VNodeChildren::Hoisted(_)) | None => {}
        }
    }
}
