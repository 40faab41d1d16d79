// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Whole-file conversions through the public API.

use approx::assert_relative_eq;
use fstr_mesh_core::{
    count_records, parse_element_record, parse_node_record, ElementType, LineClassifier,
    LineMode, SectionKind,
};
use fstr_mesh_refine::{
    linearize, subdivide, to_adventure, ConvertOptions, NodeStore, QualityConfig,
};

const UNIT_TET: &str = "\
!HEADER
 unit tetrahedron
!NODE
1,0.0,0.0,0.0
2,1.0,0.0,0.0
3,0.0,1.0,0.0
4,0.0,0.0,1.0
!ELEMENT, TYPE=341, EGRP=ALL
1,1,2,3,4
!EGROUP, EGRP=SOLID
1
!END
";

fn options() -> ConvertOptions {
    ConvertOptions::default().without_banner()
}

fn refine_str(input: &str) -> String {
    let mut out = Vec::new();
    linearize(input.as_bytes(), &mut out, &options()).unwrap();
    String::from_utf8(out).unwrap()
}

fn subdivide_str(input: &str, options: &ConvertOptions) -> String {
    let mut out = Vec::new();
    subdivide(input.as_bytes(), &mut out, options).unwrap();
    String::from_utf8(out).unwrap()
}

/// Element IDs and signed volumes of every element in a mesh
fn element_volumes(mesh: &str, element_type: ElementType) -> Vec<(i64, f64)> {
    let mut lines = LineClassifier::new(mesh.as_bytes());
    let mut nodes = NodeStore::new();
    let mut elements = Vec::new();

    while let Some(line) = lines.next_line().unwrap() {
        if line.mode != LineMode::Data {
            continue;
        }
        match line.section {
            SectionKind::Node => nodes.append_record(parse_node_record(line.text).unwrap()),
            SectionKind::Element => {
                elements.push(parse_element_record(line.text, element_type).unwrap())
            }
            _ => {}
        }
    }

    elements
        .iter()
        .map(|e| {
            let corners = [e.nodes[0], e.nodes[1], e.nodes[2], e.nodes[3]];
            (e.id, nodes.signed_tet_volume(corners).unwrap())
        })
        .collect()
}

/// Unit cube split into six tetrahedra around its main diagonal
fn cube_mesh() -> String {
    let mut mesh = String::from("!NODE\n");
    let mut nodes = NodeStore::new();
    for id in 1..=8i64 {
        let v = id - 1;
        let (x, y, z) = ((v & 1) as f64, ((v >> 1) & 1) as f64, ((v >> 2) & 1) as f64);
        mesh.push_str(&format!("{},{},{},{}\n", id, x, y, z));
        nodes.append(id, x, y, z);
    }

    mesh.push_str("!ELEMENT, TYPE=341\n");
    let axes = [[1, 2, 4], [1, 4, 2], [2, 1, 4], [2, 4, 1], [4, 1, 2], [4, 2, 1]];
    for (i, [a, b, _]) in axes.iter().enumerate() {
        let mut tet = [1, 1 + a, 1 + a + b, 8];
        if nodes.signed_tet_volume(tet).unwrap() < 0.0 {
            tet.swap(2, 3);
        }
        mesh.push_str(&format!(
            "{},{},{},{},{}\n",
            i + 1,
            tet[0],
            tet[1],
            tet[2],
            tet[3]
        ));
    }
    mesh
}

#[test]
fn test_unit_tet_refines_to_quadratic() {
    let out = refine_str(UNIT_TET);
    let lines: Vec<&str> = out.lines().collect();

    let expected_midpoints = [
        "5,0.500000,0.500000,0.000000",
        "6,0.000000,0.500000,0.000000",
        "7,0.500000,0.000000,0.000000",
        "8,0.000000,0.000000,0.500000",
        "9,0.500000,0.000000,0.500000",
        "10,0.000000,0.500000,0.500000",
    ];
    let first = lines.iter().position(|l| l.starts_with("5,")).unwrap();
    assert_eq!(&lines[first..first + 6], &expected_midpoints[..]);

    let header = lines.iter().position(|l| l.starts_with("!ELEMENT")).unwrap();
    assert_eq!(lines[header], "!ELEMENT, TYPE=342, EGRP=ALL");
    assert_eq!(lines[header + 1], "1,1,2,3,4,5,6,7,8,9,10");
    assert_eq!(lines[header + 2], "!EGROUP, EGRP=SOLID");
    assert_eq!(lines[header + 3], "1");
    assert_eq!(lines.last(), Some(&"!END"));

    // the header section is copied untouched
    assert_eq!(lines[0], "!HEADER");
    assert_eq!(lines[1], " unit tetrahedron");
}

#[test]
fn test_unit_tet_round_trip() {
    let quadratic = refine_str(UNIT_TET);

    let mut out = Vec::new();
    let summary = subdivide(quadratic.as_bytes(), &mut out, &options()).unwrap();
    let linear = String::from_utf8(out).unwrap();

    assert_eq!(summary.output_elements, 8);
    assert!(summary.quality.is_clean());
    let vr = summary.quality.volume_ratio;
    assert_relative_eq!(vr.min.unwrap().value, 1.0, epsilon = 1e-9);
    assert_relative_eq!(vr.max.unwrap().value, 1.0, epsilon = 1e-9);

    let volumes = element_volumes(&linear, ElementType::Linear4);
    let ids: Vec<i64> = volumes.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    for (_, v) in &volumes {
        assert!(*v > 0.0);
    }
    let total: f64 = volumes.iter().map(|(_, v)| v).sum();
    assert_relative_eq!(total, 1.0 / 6.0, epsilon = 1e-9);

    // the element group now lists all eight children
    let lines: Vec<&str> = linear.lines().collect();
    let group = lines.iter().position(|l| l.starts_with("!EGROUP")).unwrap();
    assert_eq!(
        &lines[group + 1..group + 9],
        &["1", "2", "3", "4", "5", "6", "7", "8"][..]
    );
}

#[test]
fn test_cube_shares_edges() {
    let cube = cube_mesh();
    let mut out = Vec::new();
    let summary = linearize(cube.as_bytes(), &mut out, &options()).unwrap();

    // 12 cube edges, 6 face diagonals, 1 body diagonal
    assert_eq!(summary.midpoints, 19);
    assert_eq!(summary.elements, 6);

    let stats = summary.edge_stats.unwrap();
    assert_eq!(stats.active_nodes, 8);
    assert_eq!(stats.used, 19);
    // both ends of the body diagonal touch every tet
    assert_eq!(stats.max_degree, 7);

    let counts = count_records(out.as_slice()).unwrap();
    assert_eq!(counts.nodes(), 8 + 19);
    assert_eq!(counts.elements(), 6);
}

#[test]
fn test_cube_round_trip_keeps_volume() {
    let quadratic = refine_str(&cube_mesh());

    let mut out = Vec::new();
    let summary = subdivide(quadratic.as_bytes(), &mut out, &options()).unwrap();
    assert_eq!(summary.output_elements, 48);
    assert!(summary.quality.is_clean(), "{}", summary.quality);

    let linear = String::from_utf8(out).unwrap();
    let volumes = element_volumes(&linear, ElementType::Linear4);
    assert_eq!(volumes.len(), 48);
    let total: f64 = volumes.iter().map(|(_, v)| v).sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-9);
}

#[test]
fn test_unsorted_nodes() {
    let input = "\
!NODE
4,0.0,0.0,1.0
2,1.0,0.0,0.0
1,0.0,0.0,0.0
3,0.0,1.0,0.0
!ELEMENT, TYPE=341
1,1,2,3,4
";
    let out = refine_str(input);
    let lines: Vec<&str> = out.lines().collect();
    // source nodes keep their file order
    assert_eq!(&lines[1..3], &["4,0.000000,0.000000,1.000000", "2,1.000000,0.000000,0.000000"][..]);
    assert_eq!(lines.last(), Some(&"1,1,2,3,4,5,6,7,8,9,10"));
}

#[test]
fn test_degenerate_element_dumped() {
    let dir = std::env::temp_dir().join(format!("fstr-mesh-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    // all ten nodes in the z = 0 plane
    let flat = "\
!NODE
1,0.0,0.0,0.0
2,1.0,0.0,0.0
3,0.0,1.0,0.0
4,1.0,1.0,0.0
!ELEMENT, TYPE=341
3,1,2,3,4
";
    let quadratic = refine_str(flat);

    let options = options().with_quality(QualityConfig {
        dump_dir: Some(dir.clone()),
        ..QualityConfig::default()
    });
    let mut out = Vec::new();
    let summary = subdivide(quadratic.as_bytes(), &mut out, &options).unwrap();

    assert_eq!(summary.quality.flagged_elements, 1);
    assert_eq!(summary.quality.dumps_written, 1);
    let dump = std::fs::read_to_string(dir.join("e3.inp")).unwrap();
    assert!(dump.contains("tet2"));
    assert!(dump.ends_with("10 10\n"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_adventure_export_of_refined_mesh() {
    let quadratic = refine_str(UNIT_TET);
    let mut out = Vec::new();
    let summary = to_adventure(quadratic.as_bytes(), &mut out).unwrap();

    assert_eq!(summary.elements, 1);
    assert_eq!(summary.nodes, 10);
    assert_eq!(summary.element_type, Some(ElementType::Quadratic10));

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[..3], ["1", "3 1 0 2 8 7 9 6 5 4", "10"]);
}

#[test]
fn test_banner_names_source() {
    let options = ConvertOptions::default().with_source_name("unit.msh");
    let mut out = Vec::new();
    linearize(UNIT_TET.as_bytes(), &mut out, &options).unwrap();
    let refined = String::from_utf8(out).unwrap();
    assert!(refined.contains("# Original 341 mesh: unit.msh\n"));

    let back = subdivide_str(&refined, &options.clone().with_source_name("unit342.msh"));
    assert!(back.contains("# Original 342 mesh: unit342.msh\n"));
    // the first banner is carried through as comments
    assert!(back.contains("# Original 341 mesh: unit.msh\n"));
}
