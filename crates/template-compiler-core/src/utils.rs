//! Naming helpers shared by the transforms and the DOM layer.

/// Convert kebab-case to camelCase. A hyphen not followed by a word
/// character is kept.
pub fn camelize(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '-' && (next.is_alphanumeric() || next == '_') => {
                result.extend(next.to_uppercase());
                chars.next();
            }
            _ => result.push(c),
        }
    }

    result
}

/// Uppercase the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Event name to handler prop key: `click` to `onClick`.
pub fn to_handler_key(event: &str) -> String {
    if event.is_empty() {
        String::new()
    } else {
        format!("on{}", capitalize(event))
    }
}

/// Whether a prop key names an event handler (`onClick`, `onUpdate:x`).
pub fn is_on(key: &str) -> bool {
    key.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_ascii_lowercase())
}

/// A valid JavaScript variable name for a runtime-resolved asset, such as
/// `_component_my_button` for `my-button`.
pub fn to_valid_asset_id(name: &str, kind: &str) -> String {
    let mut id = format!("_{}_", kind);
    for (i, c) in name.char_indices() {
        if c.is_ascii_alphanumeric() || c == '_' {
            id.push(c);
        } else if c == '-' {
            id.push('_');
        } else {
            // Other characters become their UTF-16 code unit.
            let unit = name[i..].encode_utf16().next().unwrap_or(0);
            id.push_str(&unit.to_string());
        }
    }
    id
}

/// Directives compiled by the core rather than resolved at runtime.
pub fn is_builtin_directive(name: &str) -> bool {
    matches!(
        name,
        "bind" | "cloak" | "else-if" | "else" | "for" | "html" | "if" | "model" | "on" | "once"
            | "pre" | "show" | "slot" | "text" | "memo"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("foo-bar"), "fooBar");
        assert_eq!(camelize("foo-bar-baz"), "fooBarBaz");
        assert_eq!(camelize("foo"), "foo");
        assert_eq!(camelize("foo-"), "foo-");
    }

    #[test]
    fn test_handler_keys() {
        assert_eq!(to_handler_key("click"), "onClick");
        assert_eq!(to_handler_key("update:modelValue"), "onUpdate:modelValue");
        assert!(is_on("onClick"));
        assert!(is_on("onUpdate:x"));
        assert!(!is_on("once"));
        assert!(!is_on("on"));
    }

    #[test]
    fn test_to_valid_asset_id() {
        assert_eq!(to_valid_asset_id("my-button", "component"), "_component_my_button");
        assert_eq!(to_valid_asset_id("Foo.Bar", "component"), "_component_Foo46Bar");
        assert_eq!(to_valid_asset_id("focus", "directive"), "_directive_focus");
    }
}
