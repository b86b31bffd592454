//! Simple inspector for OSM XML documents and encoded change files.
//!
//! Files ending in `.osm`, `.osc` or `.xml` are scanned as XML; anything
//! else is decoded as a (possibly zstd-compressed) binary change.

use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;

use osm::util::format_timestamp;
use osm::{decode_change, Osm, Scanner, XmlScanner};

fn summarize(label: &str, osm: &Osm) {
    println!(
        "  {}: {} nodes, {} ways, {} relations",
        label,
        osm.nodes.len(),
        osm.ways.len(),
        osm.relations.len()
    );
    for node in osm.nodes.iter().take(5) {
        println!(
            "      node {} ({:.7}, {:.7}) v{} at {} tags={}",
            node.id,
            node.lat,
            node.lon,
            node.version,
            format_timestamp(node.timestamp),
            node.tags.len()
        );
    }
    if osm.nodes.len() > 5 {
        println!("      ... and {} more nodes", osm.nodes.len() - 5);
    }
}

fn scan_xml(path: &str) {
    let file = fs::File::open(path).expect("Failed to open file");
    let mut scanner = XmlScanner::new(BufReader::new(file));

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    while scanner.scan() {
        if let Some(object) = scanner.object() {
            *counts.entry(object.kind()).or_default() += 1;
        }
    }

    println!("\n=== Objects ===");
    for (kind, count) in &counts {
        println!("  {}: {}", kind, count);
    }
    if let Some(err) = scanner.err() {
        println!("\nScan stopped early: {}", err);
    }
}

fn decode_binary(path: &str) {
    let data = fs::read(path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let change = decode_change(&data).expect("Failed to decode");

    println!("\n=== Change ===");
    let partitions = [
        ("create", &change.create),
        ("modify", &change.modify),
        ("delete", &change.delete),
    ];
    for (label, partition) in partitions {
        match partition {
            Some(osm) => summarize(label, osm),
            None => println!("  {}: absent", label),
        }
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/change.osc".to_string());

    println!("Reading: {}", path);

    if [".osm", ".osc", ".xml"].iter().any(|ext| path.ends_with(ext)) {
        scan_xml(&path);
    } else {
        decode_binary(&path);
    }
}
