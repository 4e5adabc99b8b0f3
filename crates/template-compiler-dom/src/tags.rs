//! Platform tag tables.
//!
//! Lookups are case-sensitive: `Button` is a component, `button` is not.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

const HTML_TAGS: &[&str] = &[
    "html", "body", "base", "head", "link", "meta", "style", "title", "address", "article", "aside",
    "footer", "header", "hgroup", "h1", "h2", "h3", "h4", "h5", "h6", "nav", "section", "div", "dd",
    "dl", "dt", "figcaption", "figure", "picture", "hr", "img", "li", "main", "ol", "p", "pre", "ul",
    "a", "b", "abbr", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "kbd", "mark",
    "q", "rp", "rt", "ruby", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u",
    "var", "wbr", "area", "audio", "map", "track", "video", "embed", "object", "param", "source",
    "canvas", "script", "noscript", "del", "ins", "caption", "col", "colgroup", "table", "thead",
    "tbody", "td", "th", "tr", "button", "datalist", "fieldset", "form", "input", "label", "legend",
    "meter", "optgroup", "option", "output", "progress", "select", "textarea", "details", "dialog",
    "menu", "summary", "template", "blockquote", "iframe", "tfoot", "search",
];

const SVG_TAGS: &[&str] = &[
    "svg", "animate", "animateMotion", "animateTransform", "circle", "clipPath", "color-profile",
    "defs", "desc", "discard", "ellipse", "feBlend", "feColorMatrix", "feComponentTransfer",
    "feComposite", "feConvolveMatrix", "feDiffuseLighting", "feDisplacementMap", "feDistantLight",
    "feDropShadow", "feFlood", "feFuncA", "feFuncB", "feFuncG", "feFuncR", "feGaussianBlur",
    "feImage", "feMerge", "feMergeNode", "feMorphology", "feOffset", "fePointLight",
    "feSpecularLighting", "feSpotLight", "feTile", "feTurbulence", "filter", "foreignObject", "g",
    "hatch", "hatchpath", "image", "line", "linearGradient", "marker", "mask", "mesh",
    "meshgradient", "meshpatch", "meshrow", "metadata", "mpath", "path", "pattern", "polygon",
    "polyline", "radialGradient", "rect", "set", "solidcolor", "stop", "switch", "symbol", "text",
    "textPath", "title", "tspan", "unknown", "use", "view",
];

const MATH_TAGS: &[&str] = &[
    "annotation", "annotation-xml", "maction", "maligngroup", "malignmark", "math", "menclose",
    "merror", "mfenced", "mfrac", "mfraction", "mglyph", "mi", "mlabeledtr", "mlongdiv",
    "mmultiscripts", "mn", "mo", "mover", "mpadded", "mphantom", "mprescripts", "mroot", "mrow",
    "ms", "mscarries", "mscarry", "msgroup", "msline", "mspace", "msqrt", "msrow", "mstack",
    "mstyle", "msub", "msubsup", "msup", "mtable", "mtd", "mtext", "mtr", "munder", "munderover",
    "none", "semantics",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

static HTML: Lazy<FxHashSet<&'static str>> = Lazy::new(|| HTML_TAGS.iter().copied().collect());
static SVG: Lazy<FxHashSet<&'static str>> = Lazy::new(|| SVG_TAGS.iter().copied().collect());
static MATH: Lazy<FxHashSet<&'static str>> = Lazy::new(|| MATH_TAGS.iter().copied().collect());
static VOID: Lazy<FxHashSet<&'static str>> = Lazy::new(|| VOID_TAGS.iter().copied().collect());

/// Check if a tag is an HTML element.
pub fn is_html_tag(tag: &str) -> bool {
    HTML.contains(tag)
}

/// Check if a tag is an SVG element.
pub fn is_svg_tag(tag: &str) -> bool {
    SVG.contains(tag)
}

/// Check if a tag is a MathML element.
pub fn is_math_tag(tag: &str) -> bool {
    MATH.contains(tag)
}

/// Any platform element. Everything else is a component.
pub fn is_native_tag(tag: &str) -> bool {
    is_html_tag(tag) || is_svg_tag(tag) || is_math_tag(tag)
}

/// Elements that never have content or an end tag.
pub fn is_void_tag(tag: &str) -> bool {
    VOID.contains(tag)
}

/// Elements whose whitespace is kept as written.
pub fn is_pre_tag(tag: &str) -> bool {
    tag == "pre"
}
