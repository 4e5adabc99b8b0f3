//! Runtime helpers exported by the DOM runtime.

use template_compiler_core::RuntimeHelper;

pub const V_SHOW: RuntimeHelper = RuntimeHelper("vShow");
pub const V_MODEL_TEXT: RuntimeHelper = RuntimeHelper("vModelText");
pub const V_MODEL_CHECKBOX: RuntimeHelper = RuntimeHelper("vModelCheckbox");
pub const V_MODEL_RADIO: RuntimeHelper = RuntimeHelper("vModelRadio");
pub const V_MODEL_SELECT: RuntimeHelper = RuntimeHelper("vModelSelect");
pub const V_MODEL_DYNAMIC: RuntimeHelper = RuntimeHelper("vModelDynamic");
pub const WITH_MODIFIERS: RuntimeHelper = RuntimeHelper("withModifiers");
pub const WITH_KEYS: RuntimeHelper = RuntimeHelper("withKeys");
