//! `pymol_get_selection_info`: chains and residue ranges of a selection.
//!
//! Chains are found by counting atoms for each of the chain ids `A`..`Z`, one
//! remote call per letter. Lowercase, numeric and multi-character chain ids
//! are not detected. Residues are read from the selection's PDB text by
//! [`parse_atom_records`], which knows nothing about the probing.

use std::collections::BTreeMap;

use super::dispatch::count_atoms;
use crate::error::BridgeError;
use crate::pymol::{PymolConnection, XmlValue};

/// Chain ids probed one by one.
pub const CHAIN_IDS: std::ops::RangeInclusive<char> = 'A'..='Z';

/// One ATOM/HETATM record reduced to the columns the summary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomRecord {
    pub chain: char,
    pub resi: i64,
    pub resn: String,
}

/// A chain found by probing, with its atom count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainCount {
    pub chain: char,
    pub atoms: i64,
}

/// Columns are fixed-width; `None` if the line is shorter than `start`.
fn column(line: &str, start: usize, end: usize) -> Option<&str> {
    let end = end.min(line.len());
    if start >= end {
        return None;
    }
    line.get(start..end)
}

/// Parse every ATOM/HETATM line of PDB text. Chain id is column 22, residue
/// name columns 18-20 and residue number columns 23-26 (1-based). Records
/// whose residue number is not an integer are skipped.
pub fn parse_atom_records(pdb: &str) -> Vec<AtomRecord> {
    pdb.lines()
        .filter(|line| line.starts_with("ATOM") || line.starts_with("HETATM"))
        .filter_map(|line| {
            let chain = line.get(21..22)?.chars().next()?;
            let resi = column(line, 22, 26)?.trim().parse::<i64>().ok()?;
            let resn = column(line, 17, 20).map(str::trim).unwrap_or_default();
            Some(AtomRecord {
                chain,
                resi,
                resn: resn.to_string(),
            })
        })
        .collect()
}

/// Render the multi-line summary. Residues of chains that were not found by
/// probing are ignored.
pub fn summarize(selection: &str, total_atoms: i64, chains: &[ChainCount], records: &[AtomRecord]) -> String {
    let mut by_chain: BTreeMap<char, Vec<&AtomRecord>> = BTreeMap::new();
    for record in records {
        if chains.iter().any(|c| c.chain == record.chain) {
            by_chain.entry(record.chain).or_default().push(record);
        }
    }

    let mut out = format!("Selection '{selection}' info:\nTotal atoms: {total_atoms}\nChains:\n");
    for chain in chains {
        out.push_str(&format!("  Chain {}: {} atoms", chain.chain, chain.atoms));
        if let Some(residues) = by_chain.get_mut(&chain.chain) {
            // Stable sort: the first record of the lowest residue names it.
            residues.sort_by_key(|r| r.resi);
            if let (Some(first), Some(last)) = (residues.first(), residues.last()) {
                if first.resi == last.resi {
                    out.push_str(&format!(", residue {} ({})", first.resi, first.resn));
                } else {
                    out.push_str(&format!(", residues {}-{}", first.resi, last.resi));
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Run the composite against PyMOL.
pub async fn selection_info(conn: &PymolConnection, selection: &str) -> Result<String, BridgeError> {
    let total = count_atoms(conn, selection).await?;
    if total == 0 {
        return Ok(format!("Selection '{selection}' is empty; no atoms are selected"));
    }

    let mut chains = Vec::new();
    for chain in CHAIN_IDS {
        let atoms = count_atoms(conn, &format!("({selection}) and chain {chain}")).await?;
        if atoms > 0 {
            chains.push(ChainCount { chain, atoms });
        }
    }

    let pdb = conn
        .invoke("get_pdbstr", &[XmlValue::from(selection)])
        .await?;
    let records = match &pdb {
        XmlValue::String(text) => parse_atom_records(text),
        XmlValue::Nil => Vec::new(),
        other => {
            return Err(BridgeError::unexpected_reply(
                "get_pdbstr",
                format!("expected a string, got {other}"),
            ));
        }
    };

    tracing::debug!(
        selection,
        chains = chains.len(),
        records = records.len(),
        "selection info collected"
    );
    Ok(summarize(selection, total, &chains, &records))
}
