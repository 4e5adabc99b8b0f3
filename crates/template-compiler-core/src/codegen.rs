//! Render-function code generation.
//!
//! Prints the codegen tree depth-first while recording every runtime helper
//! it references. The preamble (helper imports or destructuring, hoisted
//! constants) is assembled once the body is known.

use crate::ast::{json_string, CompoundChild, CompoundExpression, ExpressionNode, RootNode};
use crate::helpers::RuntimeHelper;
use crate::js::*;
use crate::options::{CodegenMode, CompilerOptions};
use crate::utils::to_valid_asset_id;
use indexmap::IndexSet;

const PURE_ANNOTATION: &str = "/*#__PURE__*/";

/// Generated code and what it references.
#[derive(Debug, Clone, Default)]
pub struct CodegenResult {
    /// The complete output: preamble followed by the render function.
    pub code: String,
    /// Helper imports and hoisted constants.
    pub preamble: String,
    /// Helpers in order of first use.
    pub helpers: Vec<RuntimeHelper>,
    /// Source of each hoisted constant, without its declaration.
    pub hoists: Vec<String>,
}

/// Emit the render function for a transformed, analyzed template.
pub fn generate(root: &RootNode, options: &CompilerOptions) -> CodegenResult {
    let with_mode = !options.prefix_identifiers && options.mode == CodegenMode::Function;
    let mut generator = Generator::default();

    let hoists: Vec<String> = root
        .hoists
        .iter()
        .map(|hoist| {
            let mut writer = CodeWriter::new(0);
            if matches!(hoist, JsChildNode::VNodeCall(_) | JsChildNode::TextCall(_) | JsChildNode::Call(_)) {
                writer.push(PURE_ANNOTATION);
            }
            generator.gen_node(hoist, &mut writer);
            writer.finish()
        })
        .collect();
    let hoist_helpers: Vec<RuntimeHelper> = generator.helpers.iter().copied().collect();

    let body_indent = if with_mode { 2 } else { 1 };
    let mut body = CodeWriter::new(body_indent);
    generator.gen_assets(root, &mut body);
    body.push("return ");
    match &root.codegen_node {
        Some(node) => generator.gen_node(node, &mut body),
        None => body.push("null"),
    }
    let body = body.finish();
    let helpers: Vec<RuntimeHelper> = generator.helpers.into_iter().collect();

    let mut preamble = String::new();
    match options.mode {
        CodegenMode::Module => {
            if !helpers.is_empty() {
                let imports = helpers
                    .iter()
                    .map(|h| format!("{} as {}", h.name(), h.alias()))
                    .collect::<Vec<_>>()
                    .join(", ");
                preamble.push_str(&format!(
                    "import {{ {imports} }} from {}\n\n",
                    json_string(&options.runtime_module_name)
                ));
            }
        }
        CodegenMode::Function if with_mode => {
            preamble.push_str(&format!("const _Vue = {}\n", options.runtime_global_name));
            if !hoist_helpers.is_empty() {
                preamble.push_str(&format!("const {{ {} }} = _Vue\n", destructure(&hoist_helpers)));
            }
            preamble.push('\n');
        }
        CodegenMode::Function => {
            if !helpers.is_empty() {
                preamble.push_str(&format!(
                    "const {{ {} }} = {}\n\n",
                    destructure(&helpers),
                    options.runtime_global_name
                ));
            }
        }
    }
    for (index, hoist) in hoists.iter().enumerate() {
        preamble.push_str(&format!("const _hoisted_{} = {}\n", index + 1, hoist));
    }
    if !hoists.is_empty() {
        preamble.push('\n');
    }

    let mut code = preamble.clone();
    code.push_str(match options.mode {
        CodegenMode::Module => "export function render(_ctx, _cache) {\n",
        CodegenMode::Function => "return function render(_ctx, _cache) {\n",
    });
    if with_mode {
        code.push_str("  with (_ctx) {\n");
        if !helpers.is_empty() {
            code.push_str(&format!("    const {{ {} }} = _Vue\n\n", destructure(&helpers)));
        }
    }
    code.push_str(&"  ".repeat(body_indent));
    code.push_str(&body);
    code.push('\n');
    if with_mode {
        code.push_str("  }\n");
    }
    code.push('}');

    tracing::debug!(helpers = helpers.len(), hoists = hoists.len(), bytes = code.len(), "generated code");
    CodegenResult {
        code,
        preamble,
        helpers,
        hoists,
    }
}

fn destructure(helpers: &[RuntimeHelper]) -> String {
    helpers
        .iter()
        .map(|h| format!("{}: {}", h.name(), h.alias()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Text buffer with indentation-aware newlines.
struct CodeWriter {
    code: String,
    indent_level: usize,
}

impl CodeWriter {
    fn new(indent_level: usize) -> Self {
        Self {
            code: String::new(),
            indent_level,
        }
    }

    fn push(&mut self, code: &str) {
        self.code.push_str(code);
    }

    fn newline(&mut self) {
        // Blank lines carry no indentation.
        let trimmed = self.code.trim_end_matches(' ').len();
        self.code.truncate(trimmed);
        self.code.push('\n');
        self.code.push_str(&"  ".repeat(self.indent_level));
    }

    fn indent(&mut self) {
        self.indent_level += 1;
        self.newline();
    }

    fn deindent(&mut self, without_newline: bool) {
        self.indent_level = self.indent_level.saturating_sub(1);
        if !without_newline {
            self.newline();
        }
    }

    fn finish(self) -> String {
        self.code
    }
}

#[derive(Default)]
struct Generator {
    helpers: IndexSet<RuntimeHelper>,
}

impl Generator {
    fn helper(&mut self, helper: RuntimeHelper) -> String {
        self.helpers.insert(helper);
        helper.alias()
    }

    fn gen_assets(&mut self, root: &RootNode, w: &mut CodeWriter) {
        let assets = root
            .components
            .iter()
            .map(|name| (name, "component", RuntimeHelper::RESOLVE_COMPONENT))
            .chain(
                root.directives
                    .iter()
                    .map(|name| (name, "directive", RuntimeHelper::RESOLVE_DIRECTIVE)),
            )
            .collect::<Vec<_>>();
        for (name, kind, resolver) in &assets {
            let resolver = self.helper(*resolver);
            w.push(&format!(
                "const {} = {}({})",
                to_valid_asset_id(name, kind),
                resolver,
                json_string(name)
            ));
            w.newline();
        }
        if !assets.is_empty() {
            w.newline();
        }
    }

    fn gen_node(&mut self, node: &JsChildNode, w: &mut CodeWriter) {
        match node {
            JsChildNode::VNodeCall(call) => self.gen_vnode_call(call, w),
            JsChildNode::Call(call) => {
                let callee = self.helper(call.callee);
                w.push(&callee);
                w.push("(");
                self.gen_node_list(&call.args, w, false);
                w.push(")");
            }
            JsChildNode::Object(object) => self.gen_object(object, w),
            JsChildNode::Array(array) => self.gen_node_list_as_array(&array.elements, w),
            JsChildNode::Function(function) => self.gen_function(function, w),
            JsChildNode::Conditional(cond) => self.gen_conditional(cond, w),
            JsChildNode::Simple(simple) => w.push(&simple.code()),
            JsChildNode::Compound(compound) => self.gen_compound(compound, w),
            JsChildNode::Text(text) => w.push(&json_string(&text.content)),
            JsChildNode::Interpolation(interpolation) => {
                let display = self.helper(RuntimeHelper::TO_DISPLAY_STRING);
                w.push(&display);
                w.push("(");
                self.gen_expression(&interpolation.content, w);
                w.push(")");
            }
            JsChildNode::Comment(comment) => {
                let create = self.helper(RuntimeHelper::CREATE_COMMENT);
                w.push(&format!("{}({})", create, json_string(&comment.content)));
            }
            JsChildNode::TextCall(call) => {
                let create = self.helper(RuntimeHelper::CREATE_TEXT);
                w.push(&create);
                w.push("(");
                if let Some(content) = &call.content {
                    self.gen_node(content, w);
                    if call.patch_flag.is_dynamic() {
                        w.push(&format!(", {}", call.patch_flag));
                    }
                }
                w.push(")");
            }
            JsChildNode::Hoisted(index) => w.push(&format!("_hoisted_{}", index + 1)),
            JsChildNode::Helper(helper) => {
                let alias = self.helper(*helper);
                w.push(&alias);
            }
        }
    }

    fn gen_expression(&mut self, exp: &ExpressionNode, w: &mut CodeWriter) {
        match exp {
            ExpressionNode::Simple(simple) => w.push(&simple.code()),
            ExpressionNode::Compound(compound) => self.gen_compound(compound, w),
        }
    }

    fn gen_compound(&mut self, compound: &CompoundExpression, w: &mut CodeWriter) {
        for child in &compound.children {
            match child {
                CompoundChild::Raw(code) => w.push(code),
                CompoundChild::Simple(simple) => w.push(&simple.code()),
                CompoundChild::Compound(inner) => self.gen_compound(inner, w),
                CompoundChild::Text(text) => w.push(&json_string(&text.content)),
                CompoundChild::Interpolation(interpolation) => {
                    let display = self.helper(RuntimeHelper::TO_DISPLAY_STRING);
                    w.push(&display);
                    w.push("(");
                    self.gen_expression(&interpolation.content, w);
                    w.push(")");
                }
                CompoundChild::Helper(helper) => {
                    let alias = self.helper(*helper);
                    w.push(&alias);
                }
            }
        }
    }

    fn gen_vnode_call(&mut self, call: &VNodeCall, w: &mut CodeWriter) {
        if call.directives.is_some() {
            let with_directives = self.helper(RuntimeHelper::WITH_DIRECTIVES);
            w.push(&with_directives);
            w.push("(");
        }
        if call.is_block {
            let open = self.helper(RuntimeHelper::OPEN_BLOCK);
            w.push(&format!("({}({}), ", open, if call.disable_tracking { "true" } else { "" }));
        }
        let callee = self.helper(RuntimeHelper::vnode_helper(call.is_block, call.is_component));
        w.push(&callee);
        w.push("(");

        let mut args: Vec<Option<Arg<'_>>> = vec![
            Some(Arg::Tag(&call.tag)),
            call.props.as_ref().map(Arg::Node),
            call.children.as_ref().map(Arg::Children),
            (!call.patch_flag.is_empty()).then(|| Arg::Code(call.patch_flag.to_string())),
            (!call.dynamic_props.is_empty()).then(|| {
                let names = call.dynamic_props.iter().map(|p| json_string(p)).collect::<Vec<_>>();
                Arg::Code(format!("[{}]", names.join(", ")))
            }),
        ];
        while matches!(args.last(), Some(None)) {
            args.pop();
        }
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match arg {
                None => w.push("null"),
                Some(Arg::Tag(tag)) => self.gen_tag(tag, w),
                Some(Arg::Node(node)) => self.gen_node(node, w),
                Some(Arg::Children(children)) => self.gen_children(children, w),
                Some(Arg::Code(code)) => w.push(code),
            }
        }

        w.push(")");
        if call.is_block {
            w.push(")");
        }
        if let Some(directives) = &call.directives {
            w.push(", ");
            self.gen_node_list_as_array(&directives.elements, w);
            w.push(")");
        }
    }

    fn gen_tag(&mut self, tag: &VNodeTag, w: &mut CodeWriter) {
        match tag {
            VNodeTag::Literal(name) => w.push(&json_string(name)),
            VNodeTag::Component(var) => w.push(var),
            VNodeTag::Helper(helper) => {
                let alias = self.helper(*helper);
                w.push(&alias);
            }
            VNodeTag::Dynamic(node) => self.gen_node(node, w),
        }
    }

    fn gen_children(&mut self, children: &VNodeChildren, w: &mut CodeWriter) {
        match children {
            VNodeChildren::Nodes(nodes) => self.gen_node_list_as_array(nodes, w),
            VNodeChildren::Single(node) | VNodeChildren::Slots(node) | VNodeChildren::RenderList(node) => {
                self.gen_node(node, w)
            }
            VNodeChildren::Hoisted(index) => w.push(&format!("_hoisted_{}", index + 1)),
        }
    }

    fn gen_node_list_as_array(&mut self, nodes: &[JsChildNode], w: &mut CodeWriter) {
        let multiline = nodes.len() > 3 || nodes.iter().any(|n| !is_text_like(n));
        w.push("[");
        if multiline {
            w.indent();
        }
        self.gen_node_list(nodes, w, multiline);
        if multiline {
            w.deindent(false);
        }
        w.push("]");
    }

    fn gen_node_list(&mut self, nodes: &[JsChildNode], w: &mut CodeWriter, multiline: bool) {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                if multiline {
                    w.push(",");
                    w.newline();
                } else {
                    w.push(", ");
                }
            }
            self.gen_node(node, w);
        }
    }

    fn gen_object(&mut self, object: &ObjectExpression, w: &mut CodeWriter) {
        if object.properties.is_empty() {
            w.push("{}");
            return;
        }
        let multiline =
            object.properties.len() > 1 && object.properties.iter().any(|p| !matches!(p.value, JsChildNode::Simple(_)));
        w.push(if multiline { "{" } else { "{ " });
        if multiline {
            w.indent();
        }
        for (i, prop) in object.properties.iter().enumerate() {
            if i > 0 {
                w.push(",");
                if multiline {
                    w.newline();
                } else {
                    w.push(" ");
                }
            }
            self.gen_property_key(&prop.key, w);
            w.push(": ");
            self.gen_node(&prop.value, w);
        }
        if multiline {
            w.deindent(false);
        }
        w.push(if multiline { "}" } else { " }" });
    }

    fn gen_property_key(&mut self, key: &ExpressionNode, w: &mut CodeWriter) {
        match key {
            ExpressionNode::Simple(simple) if simple.is_static => {
                if is_simple_identifier(&simple.content) {
                    w.push(&simple.content);
                } else {
                    w.push(&json_string(&simple.content));
                }
            }
            _ => {
                w.push("[");
                self.gen_expression(key, w);
                w.push("]");
            }
        }
    }

    fn gen_function(&mut self, function: &FunctionExpression, w: &mut CodeWriter) {
        if function.is_slot {
            let with_ctx = self.helper(RuntimeHelper::WITH_CTX);
            w.push(&with_ctx);
            w.push("(");
        }
        w.push(&format!("({}) => ", function.params.join(", ")));
        if function.newline {
            w.push("{");
            w.indent();
        }
        match &function.returns {
            Some(returns) => {
                if function.newline {
                    w.push("return ");
                }
                self.gen_node(returns, w);
            }
            None if !function.newline => w.push("{}"),
            None => {}
        }
        if function.newline {
            w.deindent(false);
            w.push("}");
        }
        if function.is_slot {
            w.push(")");
        }
    }

    fn gen_conditional(&mut self, cond: &ConditionalExpression, w: &mut CodeWriter) {
        match &cond.test {
            JsChildNode::Simple(test) => {
                let parens = !is_simple_identifier(&test.content);
                if parens {
                    w.push("(");
                }
                w.push(&test.code());
                if parens {
                    w.push(")");
                }
            }
            test => {
                w.push("(");
                self.gen_node(test, w);
                w.push(")");
            }
        }
        if cond.newline {
            w.indent();
        }
        w.indent_level += 1;
        if !cond.newline {
            w.push(" ");
        }
        w.push("? ");
        self.gen_node(&cond.consequent, w);
        w.indent_level -= 1;
        if cond.newline {
            w.newline();
        } else {
            w.push(" ");
        }
        w.push(": ");
        let nested = matches!(cond.alternate, JsChildNode::Conditional(_));
        if !nested {
            w.indent_level += 1;
        }
        self.gen_node(&cond.alternate, w);
        if !nested {
            w.indent_level -= 1;
        }
        if cond.newline {
            w.deindent(true);
        }
    }
}

/// Arguments of a vnode call, before null filling.
enum Arg<'a> {
    Tag(&'a VNodeTag),
    Node(&'a JsChildNode),
    Children(&'a VNodeChildren),
    Code(String),
}

/// Identifier-shaped text, usable as a bare object key. Reserved words are
/// valid property names.
fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn is_text_like(node: &JsChildNode) -> bool {
    matches!(
        node,
        JsChildNode::Simple(_)
            | JsChildNode::Compound(_)
            | JsChildNode::Text(_)
            | JsChildNode::Interpolation(_)
            | JsChildNode::Helper(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SimpleExpression;
    use pretty_assertions::assert_eq;
    use template_span::Span;

    fn gen(node: &JsChildNode) -> (String, Vec<RuntimeHelper>) {
        let mut generator = Generator::default();
        let mut writer = CodeWriter::new(0);
        generator.gen_node(node, &mut writer);
        (writer.finish(), generator.helpers.into_iter().collect())
    }

    fn element(tag: &str) -> VNodeCall {
        VNodeCall::new(NodeId(0), VNodeTag::Literal(tag.into()))
    }

    #[test]
    fn test_trailing_nulls_trimmed() {
        let mut call = element("div");
        let (code, _) = gen(&JsChildNode::VNodeCall(Box::new(call.clone())));
        assert_eq!(code, r#"_createElementVNode("div")"#);

        call.patch_flag = PatchFlags::NEED_PATCH;
        let (code, _) = gen(&JsChildNode::VNodeCall(Box::new(call)));
        assert_eq!(code, r#"_createElementVNode("div", null, null, 512 /* NEED_PATCH */)"#);
    }

    #[test]
    fn test_block_and_dynamic_props() {
        let mut call = element("input");
        call.is_block = true;
        call.props = Some(JsChildNode::Object(ObjectExpression::new(vec![Property::new(
            "value",
            JsChildNode::simple("_ctx.v"),
        )])));
        call.patch_flag = PatchFlags::PROPS;
        call.dynamic_props = vec!["value".into()];
        let (code, helpers) = gen(&JsChildNode::VNodeCall(Box::new(call)));
        assert_eq!(
            code,
            r#"(_openBlock(), _createElementBlock("input", { value: _ctx.v }, null, 8 /* PROPS */, ["value"]))"#
        );
        assert_eq!(helpers, vec![RuntimeHelper::OPEN_BLOCK, RuntimeHelper::CREATE_ELEMENT_BLOCK]);
    }

    #[test]
    fn test_object_keys_and_layout() {
        let object = ObjectExpression::new(vec![
            Property::new("id", JsChildNode::string("app")),
            Property::new("data-x", JsChildNode::string("1")),
        ]);
        let (code, _) = gen(&JsChildNode::Object(object));
        assert_eq!(code, r#"{ id: "app", "data-x": "1" }"#);

        let object = ObjectExpression::new(vec![
            Property::new("a", JsChildNode::string("1")),
            Property::new("b", JsChildNode::Object(ObjectExpression::default())),
        ]);
        let (code, _) = gen(&JsChildNode::Object(object));
        assert_eq!(code, "{\n  a: \"1\",\n  b: {}\n}");
    }

    #[test]
    fn test_conditional_layout() {
        let cond = ConditionalExpression {
            test: JsChildNode::simple("_ctx.ok"),
            consequent: JsChildNode::string("yes"),
            alternate: JsChildNode::string("no"),
            newline: true,
        };
        let (code, _) = gen(&JsChildNode::Conditional(Box::new(cond)));
        assert_eq!(code, "(_ctx.ok)\n  ? \"yes\"\n  : \"no\"");

        let cond = ConditionalExpression {
            test: JsChildNode::simple("ok"),
            consequent: JsChildNode::string("yes"),
            alternate: JsChildNode::simple("undefined"),
            newline: false,
        };
        let (code, _) = gen(&JsChildNode::Conditional(Box::new(cond)));
        assert_eq!(code, r#"ok ? "yes" : undefined"#);
    }

    #[test]
    fn test_slot_function_wrapped() {
        let function = FunctionExpression {
            params: vec!["{ item }".to_string()],
            returns: Some(JsChildNode::Array(ArrayExpression {
                elements: vec![JsChildNode::simple("item")],
            })),
            newline: false,
            is_slot: true,
        };
        let (code, helpers) = gen(&JsChildNode::Function(Box::new(function)));
        assert_eq!(code, "_withCtx(({ item }) => [item])");
        assert_eq!(helpers, vec![RuntimeHelper::WITH_CTX]);
    }

    #[test]
    fn test_compound_helpers_are_collected() {
        let compound = CompoundExpression::new(
            vec![
                CompoundChild::Helper(RuntimeHelper::CAMELIZE),
                CompoundChild::raw("("),
                CompoundChild::Simple(SimpleExpression::new("_ctx.key", false, Span::default())),
                CompoundChild::raw(")"),
            ],
            Span::default(),
        );
        let (code, helpers) = gen(&JsChildNode::Compound(compound));
        assert_eq!(code, "_camelize(_ctx.key)");
        assert_eq!(helpers, vec![RuntimeHelper::CAMELIZE]);
    }

    #[test]
    fn test_reserved_word_keys_stay_bare() {
        let object = ObjectExpression::new(vec![Property::new("default", JsChildNode::simple("fn"))]);
        assert_eq!(gen(&JsChildNode::Object(object)).0, "{ default: fn }");
    }

    #[test]
    fn test_text_call() {
        let call = TextCallExpression {
            id: NodeId(1),
            content: None,
            patch_flag: PatchFlags::NONE,
            span: Span::default(),
        };
        let (code, _) = gen(&JsChildNode::TextCall(Box::new(call)));
        assert_eq!(code, "_createTextVNode()");
    }

    #[test]
    fn test_empty_template() {
        let root = RootNode {
            children: Vec::new(),
            components: Vec::new(),
            directives: Vec::new(),
            hoists: Vec::new(),
            codegen_node: None,
            span: Span::default(),
        };
        let result = generate(&root, &CompilerOptions::default());
        assert_eq!(result.code, "return function render(_ctx, _cache) {\n  return null\n}");
        assert!(result.preamble.is_empty());
    }
}
