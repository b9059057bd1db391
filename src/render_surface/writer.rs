use super::{Element, RenderSurface, Tag};
use crate::result_renderer::formatting::{ERROR_CLASS, HOSTNAME_CLASS};
use prettytable::format::FormatBuilder;
use prettytable::{Cell, Row, Table};
use std::fmt::Write;

/// Serializes the surface as an HTML fragment rooted at `<div id="result">`
pub fn write_html(surface: &RenderSurface) -> String {
    let mut out = String::from("<div id=\"result\">\n");
    for element in surface.roots() {
        write_html_element(surface, element, &mut out);
        out.push('\n');
    }
    out.push_str("</div>\n");
    out
}

fn write_html_element(surface: &RenderSurface, element: &Element, out: &mut String) {
    let tag = element.tag.name();
    match element.class {
        Some(class) => {
            let _ = write!(out, "<{} class=\"{}\">", tag, escape_html(class));
        }
        None => {
            let _ = write!(out, "<{}>", tag);
        }
    }
    out.push_str(&escape_html(&element.text));
    for child in surface.children(element) {
        write_html_element(surface, child, out);
    }
    let _ = write!(out, "</{}>", tag);
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Plain-text rendering for terminals.
///
/// Each table is laid out with its caption as title and one line per row, with the arrow cell
/// showing its verdict. Hostnames appear in parentheses after the address they belong to.
/// Result details are indented below their table, error blocks are printed verbatim.
pub fn write_text(surface: &RenderSurface) -> String {
    let mut out = String::new();
    for element in surface.roots() {
        match element.tag {
            Tag::Table => {
                if !out.is_empty() {
                    out.push('\n');
                }
                write_text_table(surface, element, &mut out);
            }
            Tag::Pre if element.has_class(ERROR_CLASS) => {
                out.push_str(&element.text);
                if !element.text.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {
                for line in surface.text_content(element).lines() {
                    let _ = writeln!(out, "    {}", line);
                }
            }
        }
    }
    out
}

fn write_text_table(surface: &RenderSurface, table: &Element, out: &mut String) {
    let mut text_table = Table::new();
    text_table.set_format(FormatBuilder::new().indent(2).padding(0, 2).build());

    for child in surface.children(table) {
        match child.tag {
            Tag::Caption => {
                text_table.set_titles(Row::new(vec![Cell::new(&surface.text_content(child))]));
            }
            Tag::Row => {
                let cells = surface
                    .children(child)
                    .map(|cell| Cell::new(&cell_text(surface, cell)))
                    .collect();
                text_table.add_row(Row::new(cells));
            }
            _ => (),
        }
    }

    // Padding of the last column is not part of the report
    for line in text_table.to_string().lines() {
        let _ = writeln!(out, "{}", line.trim_end());
    }
}

fn cell_text(surface: &RenderSurface, cell: &Element) -> String {
    let mut text = cell.text.clone();
    if let Some(class) = cell.class {
        // Arrow cells carry their verdict as class
        text.push(' ');
        text.push_str(class);
    }
    for child in surface.children(cell) {
        if child.has_class(HOSTNAME_CLASS) {
            if !child.text.is_empty() {
                let _ = write!(text, " ({})", child.text);
            }
        } else {
            text.push_str(&surface.text_content(child));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_surface() -> RenderSurface {
        let mut surface = RenderSurface::new();
        let table = surface.append_root(Element::new(Tag::Table));
        surface
            .append_child(table, Element::new(Tag::Caption).with_text("TCP"))
            .unwrap();
        let row = surface.append_child(table, Element::new(Tag::Row)).unwrap();
        let source = surface
            .append_child(row, Element::new(Tag::Cell).with_text("[fe80::1]"))
            .unwrap();
        surface
            .append_child(source, Element::new(Tag::Span).with_class("port").with_text(":22"))
            .unwrap();
        surface
            .append_child(row, Element::new(Tag::Cell).with_class("accept").with_text("\u{2192}"))
            .unwrap();
        let destination = surface
            .append_child(row, Element::new(Tag::Cell).with_text("10.0.0.2"))
            .unwrap();
        surface
            .append_child(
                destination,
                Element::new(Tag::Span).with_class("hostname").with_text("db.example"),
            )
            .unwrap();
        surface.append_root(Element::new(Tag::Pre).with_text("permit <ssh>\n"));
        surface
    }

    #[test]
    fn html_is_escaped() {
        let html = write_html(&sample_surface());
        assert_eq!(
            html,
            "<div id=\"result\">\n\
             <table><caption>TCP</caption><tr>\
             <td>[fe80::1]<span class=\"port\">:22</span></td>\
             <td class=\"accept\">\u{2192}</td>\
             <td>10.0.0.2<span class=\"hostname\">db.example</span></td>\
             </tr></table>\n\
             <pre>permit &lt;ssh&gt;\n</pre>\n\
             </div>\n"
        );
    }

    #[test]
    fn text_layout() {
        let text = write_text(&sample_surface());
        assert_eq!(
            text,
            "  TCP\n  [fe80::1]:22  \u{2192} accept  10.0.0.2 (db.example)\n    permit <ssh>\n"
        );
    }

    #[test]
    fn text_columns_are_aligned_across_lines() {
        let mut surface = RenderSurface::new();
        let table = surface.append_root(Element::new(Tag::Table));
        surface
            .append_child(table, Element::new(Tag::Caption).with_text("ICMP"))
            .unwrap();
        for (source, destination) in [("a", "10.0.0.1"), ("192.0.2.10", "b")] {
            let row = surface.append_child(table, Element::new(Tag::Row)).unwrap();
            surface
                .append_child(row, Element::new(Tag::Cell).with_text(source))
                .unwrap();
            surface
                .append_child(row, Element::new(Tag::Cell).with_class("deny").with_text("\u{2192}"))
                .unwrap();
            surface
                .append_child(row, Element::new(Tag::Cell).with_text(destination))
                .unwrap();
        }

        assert_eq!(
            write_text(&surface),
            "  ICMP\n\
             \x20 a           \u{2192} deny  10.0.0.1\n\
             \x20 192.0.2.10  \u{2192} deny  b\n"
        );
    }

    #[test]
    fn error_block_is_verbatim() {
        let mut surface = RenderSurface::new();
        surface.append_root(
            Element::new(Tag::Pre)
                .with_class("error")
                .with_text("Traceback:\n  boom"),
        );
        assert_eq!(write_text(&surface), "Traceback:\n  boom\n");
        assert_eq!(
            write_html(&surface),
            "<div id=\"result\">\n<pre class=\"error\">Traceback:\n  boom</pre>\n</div>\n"
        );
    }

    #[test]
    fn escape_html_special_characters() {
        assert_eq!(escape_html("a & b < \"c\" > 'd'"), "a &amp; b &lt; &quot;c&quot; &gt; &#39;d&#39;");
    }
}
