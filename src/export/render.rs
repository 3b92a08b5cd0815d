//! CSV and Graphviz renderings of topology rows.

use std::collections::BTreeSet;

use csv::Writer;
use handlebars::Handlebars;
use serde::Serialize;

use super::ExportError;
use super::rows::{Role, TopologyRow, classify_roles};

const CSV_HEADERS: [&str; 6] = [
    "Device",
    "IP",
    "Neighbor",
    "Local Interface",
    "Remote Interface",
    "Protocol",
];

/// Graphviz template. Distribution devices are ranked at the top,
/// access devices at the bottom.
const DOT_TEMPLATE: &str = r#"graph topology {
    graph [overlap=false, splines=true, rankdir=TB, dpi=300];
    node [shape=box, style=filled, fillcolor=lightblue, fontname="Helvetica", fontsize=10];
    edge [fontname="Helvetica", fontsize=8];

    subgraph cluster_distribution {
        label="distribution";
        rank=min;
{{#each distribution}}
        "{{this}}";
{{/each}}
    }

    subgraph cluster_access {
        label="access";
        rank=max;
{{#each access}}
        "{{this}}";
{{/each}}
    }

{{#each edges}}
    "{{from}}" -- "{{to}}" [taillabel="{{local}}", headlabel="{{remote}}", color=darkblue, labeldistance=2.0, labelfloat=false, labelangle=45];
{{/each}}
}
"#;

/// Renders rows as CSV with a header line.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if a record cannot be written.
pub fn to_csv(rows: &[TopologyRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADERS).map_err(ExportError::Csv)?;

    for row in rows {
        writer
            .write_record([
                row.device.as_str(),
                row.ip.as_str(),
                row.neighbor.as_str(),
                row.local_interface.as_str(),
                row.remote_interface.as_str(),
                row.protocol.as_str(),
            ])
            .map_err(ExportError::Csv)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

#[derive(Serialize)]
struct GraphData {
    distribution: Vec<String>,
    access: Vec<String>,
    edges: Vec<EdgeData>,
}

#[derive(Serialize)]
struct EdgeData {
    from: String,
    to: String,
    local: String,
    remote: String,
}

/// Renders rows as an undirected Graphviz graph.
///
/// Each device pair is drawn once, labelled with the interfaces of the
/// first row that mentions it; the reverse row reported by the neighbor
/// is skipped.
///
/// # Errors
///
/// Returns [`ExportError::Template`] if rendering fails.
pub fn to_dot(rows: &[TopologyRow]) -> Result<String, ExportError> {
    let roles = classify_roles(rows);
    let names_with = |wanted: Role| -> Vec<String> {
        roles
            .iter()
            .filter(|(_, role)| **role == wanted)
            .map(|(name, _)| escape(name))
            .collect()
    };

    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    let mut edges = Vec::new();
    for row in rows {
        let key = if row.device <= row.neighbor {
            (row.device.as_str(), row.neighbor.as_str())
        } else {
            (row.neighbor.as_str(), row.device.as_str())
        };
        if !seen.insert(key) {
            continue;
        }
        edges.push(EdgeData {
            from: escape(&row.device),
            to: escape(&row.neighbor),
            local: escape(&row.local_interface),
            remote: escape(&row.remote_interface),
        });
    }

    let data = GraphData {
        distribution: names_with(Role::Distribution),
        access: names_with(Role::Access),
        edges,
    };

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .render_template(DOT_TEMPLATE, &data)
        .map_err(ExportError::Template)
}

/// Escapes a value for use inside a double-quoted DOT string.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
