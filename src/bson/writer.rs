//! Renders a [`Tree`] back to BSON text (spec §4.3).
//!
//! The reference implementation runs the traversal twice: once to measure
//! the output size, once to fill a preallocated buffer. We don't need the
//! preallocation for correctness in Rust, but we keep the two-pass shape —
//! first into a [`Sink`] that only counts bytes, then into one that
//! allocates the `String` up front with that capacity — because it's the
//! cheapest way to guarantee both traversals agree, which is exactly the
//! property spec §4.3 calls out ("both traversals must produce identical
//! output").

use super::tree::{Object, ObjectKind, Tree, Value};

const INDENT_WIDTH: usize = 4;

trait Sink {
    fn emit(&mut self, s: &str);
}

struct Counter(usize);
impl Sink for Counter {
    fn emit(&mut self, s: &str) {
        self.0 += s.len();
    }
}

struct Buffer(String);
impl Sink for Buffer {
    fn emit(&mut self, s: &str) {
        self.0.push_str(s);
    }
}

/// Format a number the way the engine's number-to-text utility would: floats
/// always show a decimal point, ints never do.
pub fn format_number(value: f64, is_float: bool) -> String {
    if is_float {
        if value.fract() == 0.0 {
            format!("{value:.1}")
        } else {
            let s = format!("{value}");
            if s.contains('.') {
                s
            } else {
                format!("{s}.0")
            }
        }
    } else {
        format!("{}", value as i64)
    }
}

fn write_value(sink: &mut dyn Sink, value: &Value, indent: usize) {
    match value {
        Value::Int(i) => sink.emit(&format_number(*i as f64, false)),
        Value::Float(f) => sink.emit(&format_number(*f as f64, true)),
        Value::Bool(b) => sink.emit(if *b { "true" } else { "false" }),
        Value::String(s) => {
            sink.emit("\"");
            sink.emit(&s.replace('\\', "\\\\").replace('"', "\\\""));
            sink.emit("\"");
        }
        Value::Object(o) => {
            sink.emit(if o.kind == ObjectKind::Array { "[" } else { "{" });
            sink.emit("\n");
            write_object_body(sink, o, indent + 1);
            sink.emit(&" ".repeat(indent * INDENT_WIDTH));
            sink.emit(if o.kind == ObjectKind::Array { "]" } else { "}" });
        }
    }
}

fn write_object_body(sink: &mut dyn Sink, object: &Object, indent: usize) {
    let pad = " ".repeat(indent * INDENT_WIDTH);
    for prop in &object.properties {
        sink.emit(&pad);
        if let Some(name) = &prop.name {
            sink.emit(name);
            sink.emit(" = ");
        }
        write_value(sink, &prop.value, indent);
        sink.emit("\n");
    }
}

/// Render `tree` to BSON text.
pub fn write(tree: &Tree) -> String {
    let mut counter = Counter(0);
    write_object_body(&mut counter, &tree.root, 0);

    let mut buffer = Buffer(String::with_capacity(counter.0));
    write_object_body(&mut buffer, &tree.root, 0);
    debug_assert_eq!(
        buffer.0.len(),
        counter.0,
        "measuring and filling passes disagreed on output size"
    );
    buffer.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::tree::Object;

    #[test]
    fn formats_ints_without_decimal_and_floats_with() {
        assert_eq!(format_number(3.0, false), "3");
        assert_eq!(format_number(3.0, true), "3.0");
        assert_eq!(format_number(1.5, true), "1.5");
    }

    #[test]
    fn writes_flat_object() {
        let mut root = Object::new_object();
        root.set_int(Some("foo"), 3);
        root.set_string(Some("bar"), "hi");
        let tree = Tree { root };
        let text = write(&tree);
        assert_eq!(text, "foo = 3\nbar = \"hi\"\n");
    }

    #[test]
    fn writes_nested_array() {
        let mut root = Object::new_object();
        let mut arr = Object::new_array();
        arr.set_int(None, 1);
        arr.set_int(None, 2);
        root.set_object(Some("xs"), arr);
        let tree = Tree { root };
        let text = write(&tree);
        assert_eq!(text, "xs = [\n    1\n    2\n]\n");
    }
}
