use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::models::{ExtractedImage, PageStructure};
use crate::normalize::normalize_image_url;

// ── Constants ────────────────────────────────────────────────────────────────

const IMAGE_GROUP: &str = "image";
const INDENT: &str = " ";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

// ── Structure builder ────────────────────────────────────────────────────────

/// Build the output structure for a parsed page.
///
/// With `with_images` set, every `<img>` carrying a non-empty `src` is
/// recorded in document order under a unique name: the alt text for the first
/// occurrence, then `{alt}_001`, `{alt}_002`, ... for repeats. Images without
/// alt text are named `image_001`, `image_002`, ...
pub fn build_structure(page: Html, name: Option<String>, with_images: bool) -> PageStructure {
    tracing::info!("creating structure");
    let images = if with_images {
        collect_images(&page)
    } else {
        Vec::new()
    };

    let mut structure = PageStructure::new(name, page);
    for image in images {
        structure.push_image(image);
    }
    structure
}

fn collect_images(page: &Html) -> Vec<ExtractedImage> {
    let mut namer = Namer::default();
    let mut images = Vec::new();

    for el in page.select(&IMG_SEL) {
        let v = el.value();
        let src = match v.attr("src") {
            Some(src) if !src.is_empty() => src,
            _ => {
                tracing::info!("did not save {}", el.html());
                continue;
            }
        };

        let url = normalize_image_url(src, v.attr("data-original"));
        let alt = v.attr("alt").filter(|alt| !alt.is_empty());
        let name = namer.next_name(alt);
        tracing::debug!(name = %name, url = %url, "found image");
        images.push(ExtractedImage { name, url });
    }

    images
}

/// Per-group counters; a name already handed out is never reissued.
#[derive(Default)]
struct Namer {
    counts: HashMap<String, u32>,
    taken: HashSet<String>,
}

impl Namer {
    fn next_name(&mut self, alt: Option<&str>) -> String {
        loop {
            let name = match alt {
                Some(alt) => {
                    let count = self.counts.entry(alt.to_string()).or_insert(0);
                    let name = if *count == 0 {
                        alt.to_string()
                    } else {
                        format!("{}_{:03}", alt, count)
                    };
                    *count += 1;
                    name
                }
                None => {
                    let count = self.counts.entry(IMAGE_GROUP.to_string()).or_insert(1);
                    let name = format!("{}_{:03}", IMAGE_GROUP, count);
                    *count += 1;
                    name
                }
            };
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}

// ── Pretty printer ───────────────────────────────────────────────────────────

/// Serialize the document one node per line, children indented one space.
pub fn prettify(page: &Html) -> String {
    let mut out = String::new();
    for child in page.tree.root().children() {
        match child.value() {
            Node::Doctype(doctype) => {
                out.push_str(&format!("<!DOCTYPE {}>\n", doctype.name()));
            }
            Node::Comment(comment) => {
                out.push_str(&format!("<!--{}-->\n", &*comment.comment));
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    write_element(el, 0, &mut out);
                }
            }
            _ => {}
        }
    }
    out
}

fn write_element(el: ElementRef<'_>, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    let name = el.value().name();

    out.push_str(&indent);
    out.push('<');
    out.push_str(name);
    for (attr, value) in el.value().attrs() {
        out.push_str(&format!(" {}=\"{}\"", attr, escape_attr(value)));
    }
    out.push_str(">\n");

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw_text = matches!(name, "script" | "style");
    let child_indent = INDENT.repeat(depth + 1);
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                out.push_str(&child_indent);
                if raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
                out.push('\n');
            }
            Node::Comment(comment) => {
                out.push_str(&format!("{}<!--{}-->\n", child_indent, &*comment.comment));
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_element(child_el, depth + 1, out);
                }
            }
            _ => {}
        }
    }

    out.push_str(&indent);
    out.push_str(&format!("</{}>\n", name));
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
