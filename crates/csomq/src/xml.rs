//! Rendering of an action graph into the ProcessQuery request envelope.
//!
//! The serializer is a pure function of the graph: same graph, byte-identical
//! output. `<Actions>` and `<ObjectPaths>` are both emitted in insertion
//! order — the server streams the document and assigns contexts as it
//! parses, so reordering is a wire-compatibility break, not a style choice.
//! All text goes through [`crate::value::escape_xml_text`]; nothing here
//! escapes ad hoc.

use std::fmt::Write as _;

use crate::graph::{Action, Graph, Node, PathKind, Select};
use crate::value::{braced_guid, escape_xml_text, Value};

pub const SCHEMA_VERSION: &str = "15.0.0.0";
pub const LIBRARY_VERSION: &str = "16.0.0.0";
const XMLNS: &str = "http://schemas.microsoft.com/sharepoint/clientquery/2009";

/// Render `graph` into one `<Request>` envelope.
pub fn serialize(graph: &Graph, application_name: &str) -> String {
    let mut out = String::with_capacity(512);
    let _ = write!(
        out,
        "<Request AddExpandoFieldTypeSuffix=\"true\" SchemaVersion=\"{SCHEMA_VERSION}\" \
         LibraryVersion=\"{LIBRARY_VERSION}\" ApplicationName=\"{}\" xmlns=\"{XMLNS}\">",
        escape_xml_text(application_name)
    );
    out.push_str("<Actions>");
    for action in &graph.actions {
        write_action(&mut out, action);
    }
    out.push_str("</Actions><ObjectPaths>");
    for node in &graph.nodes {
        write_node(&mut out, node);
    }
    out.push_str("</ObjectPaths></Request>");
    out
}

fn write_action(out: &mut String, action: &Action) {
    match action {
        Action::ObjectPath { id, path } => {
            let _ = write!(out, "<ObjectPath Id=\"{id}\" ObjectPathId=\"{path}\" />");
        }
        Action::IdentityQuery { id, path } => {
            let _ = write!(
                out,
                "<ObjectIdentityQuery Id=\"{id}\" ObjectPathId=\"{path}\" />"
            );
        }
        Action::Query { id, path, select } => {
            let _ = write!(out, "<Query Id=\"{id}\" ObjectPathId=\"{path}\">");
            match select {
                Select::All => out.push_str("<Query SelectAllProperties=\"true\"><Properties /></Query>"),
                Select::Fields(fields) => {
                    out.push_str("<Query SelectAllProperties=\"false\"><Properties>");
                    for field in fields {
                        let _ = write!(
                            out,
                            "<Property Name=\"{}\" ScalarProperty=\"true\" />",
                            escape_xml_text(field)
                        );
                    }
                    out.push_str("</Properties></Query>");
                }
            }
            out.push_str("</Query>");
        }
        Action::Method {
            id,
            path,
            name,
            params,
        } => {
            let _ = write!(
                out,
                "<Method Name=\"{}\" Id=\"{id}\" ObjectPathId=\"{path}\"",
                escape_xml_text(name)
            );
            write_params_and_close(out, "Method", params);
        }
    }
}

fn write_node(out: &mut String, node: &Node) {
    let id = node.id;
    match &node.kind {
        PathKind::StaticMethod { type_id, name } => {
            let _ = write!(
                out,
                "<StaticMethod Id=\"{id}\" Name=\"{}\" TypeId=\"{}\" />",
                escape_xml_text(name),
                braced_guid(*type_id)
            );
        }
        PathKind::Method {
            parent,
            name,
            params,
        } => {
            let _ = write!(
                out,
                "<Method Id=\"{id}\" ParentId=\"{parent}\" Name=\"{}\"",
                escape_xml_text(name)
            );
            write_params_and_close(out, "Method", params);
        }
        PathKind::Property { parent, name } => {
            let _ = write!(
                out,
                "<Property Id=\"{id}\" ParentId=\"{parent}\" Name=\"{}\" />",
                escape_xml_text(name)
            );
        }
        PathKind::Identity { token } => {
            let _ = write!(
                out,
                "<Identity Id=\"{id}\" Name=\"{}\" />",
                escape_xml_text(token)
            );
        }
    }
}

/// Finish an already-open `<Method …` element: self-close when there are no
/// parameters, otherwise emit the `<Parameters>` list and a closing tag.
fn write_params_and_close(out: &mut String, tag: &str, params: &[Value]) {
    if params.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push_str("><Parameters>");
    for param in params {
        write_value_element(out, "Parameter", param);
    }
    let _ = write!(out, "</Parameters></{tag}>");
}

fn write_value_element(out: &mut String, tag: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            let _ = write!(out, "<{tag} Type=\"Array\">");
            for item in items {
                write_value_element(out, "Object", item);
            }
            let _ = write!(out, "</{tag}>");
        }
        scalar => {
            let _ = write!(
                out,
                "<{tag} Type=\"{}\">{}</{tag}>",
                scalar.type_name(),
                scalar_text(scalar)
            );
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => escape_xml_text(s).into_owned(),
        Value::Int32(n) => n.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Guid(g) => braced_guid(*g),
        Value::Array(_) => unreachable!("arrays render as elements, not text"),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
