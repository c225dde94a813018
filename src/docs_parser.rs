//! Extraction of plain text from odoc-generated HTML.
//!
//! odoc renders every module-level declaration as a `div.spec` block whose id
//! names the entity (`val-map`, `type-t`, `module-type-S`, ...). Those blocks
//! are the structural markers the extractor keys on.

use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};

/// Maximum number of spec items returned for one module.
pub const SPEC_LIMIT: usize = 100;

/// Maximum number of Sherlodoc results kept from one query.
pub const SHERLODOC_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemKind {
    #[serde(rename = "val")]
    Value,
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "module type")]
    ModuleType,
    #[serde(rename = "module")]
    Module,
    #[serde(rename = "exception")]
    Exception,
    #[serde(rename = "class")]
    Class,
    #[serde(rename = "other")]
    Other,
}

impl ItemKind {
    /// Split an odoc anchor id into the declared kind and name.
    pub fn from_anchor(anchor: &str) -> (Self, &str) {
        // `module-type-` must be tried before `module-`.
        const PREFIXES: [(&str, ItemKind); 6] = [
            ("val-", ItemKind::Value),
            ("type-", ItemKind::Type),
            ("module-type-", ItemKind::ModuleType),
            ("module-", ItemKind::Module),
            ("exception-", ItemKind::Exception),
            ("class-", ItemKind::Class),
        ];
        PREFIXES
            .iter()
            .find_map(|(prefix, kind)| anchor.strip_prefix(*prefix).map(|name| (*kind, name)))
            .unwrap_or((ItemKind::Other, anchor))
    }
}

/// One declaration from a module page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecItem {
    pub kind: ItemKind,
    pub name: String,
    pub signature: String,
    pub doc: String,
}

/// Preamble and declarations of one module page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleDoc {
    pub preamble: String,
    pub items: Vec<SpecItem>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

impl ModuleDoc {
    /// An empty result labeled with the reason nothing could be extracted.
    pub fn unparsable(reason: impl Into<String>) -> Self {
        Self {
            note: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.signature.as_str())
    }

    /// Build from the two HTML fragments of an odoc JSON page.
    ///
    /// The preamble comes from the page's preamble paragraphs, falling back to
    /// the text that precedes the first declaration in the content.
    pub fn from_page(page: &OdocPage) -> Self {
        let mut doc = extract_module_doc(&page.content, SPEC_LIMIT);
        let preamble = extract_preamble_text(&page.preamble);
        if !preamble.is_empty() {
            doc.preamble = preamble;
        }
        doc
    }

    /// Parse the raw bytes of an `index.html.json` file.
    pub fn from_page_json(json: &str) -> Self {
        match serde_json::from_str::<OdocPage>(json) {
            Ok(page) => Self::from_page(&page),
            Err(e) => {
                tracing::warn!("Unparsable odoc page: {}", e);
                Self::unparsable(format!("Documentation page could not be parsed: {e}"))
            }
        }
    }
}

/// The JSON document odoc writes next to each HTML page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OdocPage {
    #[serde(default)]
    pub preamble: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleEntry {
    pub name: String,
    pub synopsis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    pub modules: Vec<ModuleEntry>,
}

/// One hit from a Sherlodoc query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignatureHit {
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub module_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub documentation: Option<String>,
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn select_all<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(e) => {
            tracing::error!("Invalid selector {:?}: {:?}", css, e);
            Vec::new()
        }
    }
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn is_spec(element: ElementRef<'_>) -> bool {
    element.value().name() == "div" && has_class(element, "spec")
}

/// Paragraph text of an HTML fragment, paragraphs joined by one space.
pub fn extract_preamble_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    select_all(fragment.root_element(), "p")
        .into_iter()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a page into its leading text and its declarations.
///
/// Text before the first `div.spec` is the preamble. Each `div.spec` yields
/// one item in document order, its signature taken from the inner `code`
/// block with tags stripped. A page without declarations is all preamble.
pub fn extract_module_doc(html: &str, limit: usize) -> ModuleDoc {
    if html.trim().is_empty() {
        return ModuleDoc::default();
    }
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let mut preamble = String::new();
    for node in root.descendants() {
        if ElementRef::wrap(node).is_some_and(is_spec) {
            break;
        }
        if let Node::Text(text) = node.value() {
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| matches!(el.value().name(), "head" | "title" | "script" | "style" | "template"));
            if !hidden {
                preamble.push_str(text);
                preamble.push(' ');
            }
        }
    }

    let (items, truncated) = extract_specs_from(root, limit);
    ModuleDoc {
        preamble: collapse_whitespace(&preamble),
        items,
        truncated,
        note: truncated
            .then(|| format!("Output truncated at {limit} items. The module has more entries.")),
    }
}

/// Declarations of an HTML fragment, capped at `limit`.
///
/// Returns the items and whether the cap cut the list short.
pub fn extract_specs(html: &str, limit: usize) -> (Vec<SpecItem>, bool) {
    if html.trim().is_empty() {
        return (Vec::new(), false);
    }
    let fragment = Html::parse_fragment(html);
    extract_specs_from(fragment.root_element(), limit)
}

fn extract_specs_from(root: ElementRef<'_>, limit: usize) -> (Vec<SpecItem>, bool) {
    let mut items = Vec::new();
    let mut truncated = false;

    for spec in root.descendants().filter_map(ElementRef::wrap).filter(|el| is_spec(*el)) {
        if items.len() >= limit {
            truncated = true;
            break;
        }
        let anchor = spec.value().attr("id").unwrap_or_default();
        let (kind, name) = ItemKind::from_anchor(anchor);

        let signature = select_all(spec, "code")
            .into_iter()
            .next()
            .map(element_text)
            .unwrap_or_else(|| element_text(spec));

        let doc = spec
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "div" && has_class(*el, "spec-doc"))
            .map(|doc_div| {
                select_all(doc_div, "p")
                    .into_iter()
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string()
            })
            .unwrap_or_default();

        items.push(SpecItem {
            kind,
            name: name.to_string(),
            signature,
            doc,
        });
    }

    (items, truncated)
}

/// Library sections of a package index page.
///
/// An `h2` opens a library; following `ul`/`dl` lists contribute their linked
/// modules. Modules listed before any heading land in a `default` library.
pub fn extract_package_libraries(html: &str) -> Vec<Library> {
    if html.trim().is_empty() {
        return Vec::new();
    }
    let fragment = Html::parse_fragment(html);
    let mut libraries = Vec::new();
    let mut current: Option<Library> = None;

    for element in fragment.root_element().children().filter_map(ElementRef::wrap) {
        match element.value().name() {
            "h2" => {
                libraries.extend(current.take());
                current = Some(Library {
                    name: element_text(element),
                    modules: Vec::new(),
                });
            }
            "ul" | "dl" => {
                let modules: Vec<ModuleEntry> = select_all(element, "li")
                    .into_iter()
                    .filter_map(|li| {
                        let link = select_all(li, "a").into_iter().next()?;
                        let name = element_text(link);
                        let full = element_text(li);
                        let synopsis = full
                            .strip_prefix(name.as_str())
                            .unwrap_or_default()
                            .trim()
                            .trim_start_matches(':')
                            .trim()
                            .to_string();
                        Some(ModuleEntry { name, synopsis })
                    })
                    .collect();
                if !modules.is_empty() {
                    current
                        .get_or_insert_with(|| Library {
                            name: "default".to_string(),
                            modules: Vec::new(),
                        })
                        .modules
                        .extend(modules);
                }
            }
            _ => {}
        }
    }

    libraries.extend(current);
    libraries
}

/// Directory names from an Apache auto-index page.
pub fn parse_directory_listing(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    select_all(document.root_element(), "a")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !(href.starts_with('?') || href.starts_with('/') || *href == "../"))
        .filter_map(|href| href.strip_suffix('/'))
        .map(|name| name.trim_end_matches('/').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Package name from a documentation URL of the form `.../p/<package>/...`.
fn package_from_url(href: &str) -> Option<String> {
    let parsed = url::Url::parse(href).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.find(|s| *s == "p")?;
    segments
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Results of a Sherlodoc query page, at most `limit` of them.
pub fn parse_sherlodoc_results(html: &str, limit: usize) -> Vec<SignatureHit> {
    let fragment = Html::parse_fragment(html);
    select_all(fragment.root_element(), "li")
        .into_iter()
        .take(limit)
        .filter_map(|item| {
            let mut hit = SignatureHit::default();
            if let Some(pre) = select_all(item, "pre").into_iter().next() {
                hit.signature = element_text(pre);
                if let Some(link) = select_all(pre, "a").into_iter().next() {
                    if let Some(href) = link.value().attr("href") {
                        hit.url = Some(href.to_string());
                        hit.package = package_from_url(href);
                        hit.name = Some(element_text(link)).filter(|n| !n.is_empty());
                        hit.module_path = select_all(link, "em")
                            .into_iter()
                            .next()
                            .map(|em| em.text().collect::<String>());
                    }
                }
            }

            if let Some(comment) = select_all(item, "div.comment").into_iter().next() {
                let parts: Vec<String> = select_all(comment, "p").into_iter().map(element_text).collect();
                if !parts.is_empty() {
                    hit.documentation = Some(parts.join(" "));
                }
            }

            (!hit.signature.is_empty()).then_some(hit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE_CONTENT: &str = r##"
        <p>Some intro text.</p>
        <div class="odoc-spec">
          <div class="spec type anchored" id="type-t">
            <a href="#type-t" class="anchor"></a><code><span class="keyword">type</span> <span>'a t</span></code>
          </div>
          <div class="spec-doc"><p>The type of promises.</p></div>
        </div>
        <div class="odoc-spec">
          <div class="spec value anchored" id="val-map">
            <a href="#val-map" class="anchor"></a><code><span class="keyword">val</span> map :
              <span>(<span>'a -&gt; 'b</span>)</span> -&gt; <span><span>'a</span> t</span></code>
          </div>
          <div class="spec-doc"><p>Maps over a promise.</p><p>Lazily.</p></div>
        </div>
        <div class="odoc-spec">
          <div class="spec module-type anchored" id="module-type-S">
            <code><span class="keyword">module</span> <span class="keyword">type</span> S = sig ... end</code>
          </div>
        </div>
        <div class="odoc-spec">
          <div class="spec module anchored" id="module-Infix"><code>module Infix : sig ... end</code></div>
        </div>
        <div class="odoc-spec">
          <div class="spec exception anchored" id="exception-Canceled"><code>exception Canceled</code></div>
        </div>
    "##;

    #[test]
    fn test_item_kind_from_anchor() {
        assert_eq!(ItemKind::from_anchor("val-map"), (ItemKind::Value, "map"));
        assert_eq!(ItemKind::from_anchor("module-type-S"), (ItemKind::ModuleType, "S"));
        assert_eq!(ItemKind::from_anchor("module-List"), (ItemKind::Module, "List"));
        assert_eq!(ItemKind::from_anchor("class-c"), (ItemKind::Class, "c"));
        assert_eq!(ItemKind::from_anchor("extension-decl-X"), (ItemKind::Other, "extension-decl-X"));
    }

    #[test]
    fn test_extract_module_doc_signatures_in_order() {
        let doc = extract_module_doc(MODULE_CONTENT, SPEC_LIMIT);

        assert_eq!(doc.items.len(), 5);
        let signatures: Vec<&str> = doc.signatures().collect();
        assert_eq!(
            signatures,
            vec![
                "type 'a t",
                "val map : ('a -> 'b) -> 'a t",
                "module type S = sig ... end",
                "module Infix : sig ... end",
                "exception Canceled",
            ]
        );
        assert_eq!(doc.items[1].kind, ItemKind::Value);
        assert_eq!(doc.items[1].name, "map");
        assert_eq!(doc.items[1].doc, "Maps over a promise. Lazily.");
        assert_eq!(doc.items[2].doc, "");
        assert_eq!(doc.preamble, "Some intro text.");
        assert!(!doc.truncated);
        assert!(doc.note.is_none());
    }

    #[test]
    fn test_extract_module_doc_without_markers() {
        let html = "<h1>Module <code>Foo</code></h1>\n<p>Foo does   things.</p><script>var x = 1;</script>";
        let doc = extract_module_doc(html, SPEC_LIMIT);

        assert!(doc.items.is_empty());
        assert_eq!(doc.preamble, "Module Foo Foo does things.");
    }

    #[test]
    fn test_extract_module_doc_full_document_skips_head() {
        let html = "<!DOCTYPE html><html><head><title>Lwt (lwt.Lwt)</title><meta charset=\"utf-8\"/></head>\
            <body><p>Body text.</p><div class=\"spec value\" id=\"val-return\"><code>val return : 'a -&gt; 'a t</code></div></body></html>";
        let doc = extract_module_doc(html, SPEC_LIMIT);

        assert_eq!(doc.preamble, "Body text.");
        assert_eq!(doc.signatures().collect::<Vec<_>>(), vec!["val return : 'a -> 'a t"]);
    }

    #[test]
    fn test_preamble_round_trip() {
        let first = extract_module_doc(MODULE_CONTENT, SPEC_LIMIT);
        let rewrapped = format!("<p>{}</p>", first.preamble.replace('&', "&amp;").replace('<', "&lt;"));
        let second = extract_module_doc(&rewrapped, SPEC_LIMIT);
        assert_eq!(first.preamble, second.preamble);
        assert_eq!(extract_preamble_text(&rewrapped), first.preamble);
    }

    #[test]
    fn test_extract_module_doc_truncates() {
        let html: String = (0..5)
            .map(|i| format!(r#"<div class="spec value" id="val-f{i}"><code>val f{i} : int</code></div>"#))
            .collect();
        let doc = extract_module_doc(&html, 3);

        assert_eq!(doc.items.len(), 3);
        assert!(doc.truncated);
        assert!(doc.note.unwrap().contains("truncated at 3"));

        let (items, truncated) = extract_specs(&html, 5);
        assert_eq!(items.len(), 5);
        assert!(!truncated);
    }

    #[test]
    fn test_spec_without_code_uses_block_text() {
        let html = r#"<div class="spec" id="val-x">val x : <b>int</b></div>"#;
        let (items, _) = extract_specs(html, SPEC_LIMIT);
        assert_eq!(items[0].signature, "val x : int");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_module_doc("", SPEC_LIMIT), ModuleDoc::default());
        assert_eq!(extract_preamble_text("   "), "");
        assert_eq!(extract_specs("", SPEC_LIMIT), (Vec::new(), false));
    }

    #[test]
    fn test_from_page_prefers_preamble_paragraphs() {
        let page = OdocPage {
            preamble: "<h1>Module <code>Lwt</code></h1><p>Asynchronous programming with promises.</p>".into(),
            content: MODULE_CONTENT.into(),
        };
        let doc = ModuleDoc::from_page(&page);
        assert_eq!(doc.preamble, "Asynchronous programming with promises.");
        assert_eq!(doc.items.len(), 5);
    }

    #[test]
    fn test_from_page_json_malformed_is_labeled() {
        let doc = ModuleDoc::from_page_json("{not json");
        assert!(doc.items.is_empty());
        assert!(doc.preamble.is_empty());
        assert!(doc.note.unwrap().contains("could not be parsed"));

        let doc = ModuleDoc::from_page_json(r#"{"type":"documentation"}"#);
        assert_eq!(doc, ModuleDoc::default());
    }

    #[test]
    fn test_extract_preamble_text() {
        let html = "<h1>Title</h1><p>First  paragraph.</p><div><p>Second\nparagraph.</p></div>";
        assert_eq!(extract_preamble_text(html), "First paragraph. Second paragraph.");
    }

    #[test]
    fn test_extract_package_libraries() {
        let html = r#"
            <p>Intro.</p>
            <ul><li><a href="Top/index.html">Top</a> : stray module</li></ul>
            <h2 id="lwt">Library <code>lwt</code></h2>
            <ul>
              <li><a href="lwt/Lwt/index.html"><code>Lwt</code></a> Asynchronous programming</li>
              <li><a href="lwt/Lwt_list/index.html"><code>Lwt_list</code></a></li>
              <li>no link here</li>
            </ul>
            <h2>Library <code>lwt.unix</code></h2>
            <dl><li><a href="lwt.unix/Lwt_unix/index.html">Lwt_unix</a>: Unix bindings</li></dl>
            <h2>Empty</h2>
        "#;
        let libraries = extract_package_libraries(html);

        assert_eq!(libraries.len(), 4);
        assert_eq!(libraries[0].name, "default");
        assert_eq!(libraries[0].modules[0].synopsis, "stray module");
        assert_eq!(libraries[1].name, "Library lwt");
        assert_eq!(
            libraries[1].modules,
            vec![
                ModuleEntry { name: "Lwt".into(), synopsis: "Asynchronous programming".into() },
                ModuleEntry { name: "Lwt_list".into(), synopsis: "".into() },
            ]
        );
        assert_eq!(libraries[2].modules[0].synopsis, "Unix bindings");
        assert!(libraries[3].modules.is_empty());
    }

    #[test]
    fn test_parse_directory_listing() {
        let html = r#"<html><body><h1>Index of /current/p</h1>
            <a href="?C=N;O=D">Name</a> <a href="/current/">Parent Directory</a>
            <a href="../">../</a>
            <a href="lwt/">lwt/</a> <a href="base/">base/</a> <a href="README.txt">README.txt</a>
            </body></html>"#;
        assert_eq!(parse_directory_listing(html), vec!["lwt", "base"]);
    }

    #[test]
    fn test_parse_sherlodoc_results() {
        let html = r#"<ol>
          <li>
            <pre><a href="https://ocaml.org/p/base/v0.16.3/doc/Base/List/index.html#val-map"><em>Base.List.</em>map</a> : 'a t -&gt; f:('a -&gt; 'b) -&gt; 'b t</pre>
            <div class="comment"><p>map f l applies f.</p><p>Tail recursive.</p></div>
          </li>
          <li><pre>int -&gt; string</pre></li>
          <li><div class="comment"><p>no signature</p></div></li>
        </ol>"#;
        let hits = parse_sherlodoc_results(html, SHERLODOC_LIMIT);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].signature, "Base.List.map : 'a t -> f:('a -> 'b) -> 'b t");
        assert_eq!(hits[0].name.as_deref(), Some("Base.List.map"));
        assert_eq!(hits[0].module_path.as_deref(), Some("Base.List."));
        assert_eq!(hits[0].package.as_deref(), Some("base"));
        assert_eq!(hits[0].documentation.as_deref(), Some("map f l applies f. Tail recursive."));
        assert_eq!(hits[1].signature, "int -> string");
        assert!(hits[1].url.is_none());

        assert_eq!(parse_sherlodoc_results(html, 1).len(), 1);
    }
}
