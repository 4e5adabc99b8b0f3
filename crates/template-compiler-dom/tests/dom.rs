use pretty_assertions::assert_eq;
use template_compiler_core::{CodegenMode, CompilerOptions};
use template_compiler_dom::{compile, dom_options, with_dom};

#[test]
fn test_model_on_text_input() {
    let output = compile(r#"<input v-model="msg">"#, &dom_options());
    assert!(output.errors.is_empty());
    insta::assert_snapshot!(output.code, @r###"
    const { withDirectives: _withDirectives, openBlock: _openBlock, createElementBlock: _createElementBlock, vModelText: _vModelText } = Vue

    return function render(_ctx, _cache) {
      return _withDirectives((_openBlock(), _createElementBlock("input", { "onUpdate:modelValue": $event => ((_ctx.msg) = $event) }, null, 8 /* PROPS */, ["onUpdate:modelValue"])), [
        [_vModelText, _ctx.msg]
      ])
    }
    "###);
}

#[test]
fn test_native_tags_are_not_components() {
    let output = compile("<div><button>a</button><Button>b</Button><circle/></div>", &dom_options());
    assert_eq!(output.components.iter().map(|c| c.as_str()).collect::<Vec<_>>(), vec!["Button"]);
    assert!(output.code.contains(r#"_resolveComponent("Button")"#));
    assert!(!output.code.contains(r#"_resolveComponent("button")"#));
    assert!(!output.code.contains(r#"_resolveComponent("circle")"#));
}

#[test]
fn test_unknown_tags_resolve_as_components() {
    let output = compile("<my-widget></my-widget>", &dom_options());
    assert_eq!(output.components.iter().map(|c| c.as_str()).collect::<Vec<_>>(), vec!["my-widget"]);
}

#[test]
fn test_void_tags_need_no_end_tag() {
    let output = compile("<p>a<br>b</p><img src=\"x.png\">", &dom_options());
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert!(output.code.contains(r#""br""#));
    assert!(output.code.contains(r#"{ src: "x.png" }"#));
}

#[test]
fn test_pre_keeps_whitespace() {
    let output = compile("<pre>  a  b</pre><p>  a  b</p>", &dom_options());
    assert!(output.code.contains(r#""  a  b""#));
    assert!(output.code.contains(r#"" a b""#));
}

#[test]
fn test_form_template() {
    let source = r#"<form @submit.prevent="save">
  <input v-model.trim="form.name" @keydown.esc="reset">
  <label v-show="form.name" style="color: gray">{{ form.name }}</label>
  <div v-html="preview"></div>
</form>"#;
    let output = compile(source, &dom_options());
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    let code = &output.code;
    assert!(code.contains(r#"onSubmit: _withModifiers(_ctx.save, ["prevent"])"#));
    assert!(code.contains(r#"onKeydown: _withKeys(_ctx.reset, ["esc"])"#));
    assert!(code.contains("_vModelText,"));
    assert!(code.contains("{ trim: true }"));
    assert!(code.contains("[_vShow, _ctx.form.name]"));
    assert!(code.contains(r#"style: {"color":"gray"}"#));
    assert!(code.contains("innerHTML: _ctx.preview"));
}

#[test]
fn test_module_mode_imports_dom_helpers() {
    let options = with_dom(CompilerOptions {
        mode: CodegenMode::Module,
        ..Default::default()
    });
    let output = compile(r#"<div v-show="open"></div>"#, &options);
    assert!(output.code.starts_with("import { "));
    assert!(output.code.contains("vShow as _vShow"));
    assert!(output.code.contains(r#"} from "vue""#));
}
