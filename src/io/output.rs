//! Formats the final per-entity score table to a writer.

use std::io::{self, Write};

use crate::aggregate::FlatNodeCorrScores;
use crate::registry::EntityRegistry;

/// One line per entity in entity-index order: `<name>\t<score>\n`. Unknown
/// scores print as the literal `NaN`.
pub fn write_scores<W: Write>(
    mut out: W,
    registry: &EntityRegistry,
    scores: &FlatNodeCorrScores,
) -> io::Result<()> {
    for (index, &score) in scores.scores.iter().enumerate() {
        let name = registry.lookup(index);
        if score.is_nan() {
            writeln!(out, "{name}\tNaN")?;
        } else {
            writeln!(out, "{name}\t{score}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_nan_literally() {
        let mut registry = EntityRegistry::new();
        registry.intern("e1").unwrap();
        registry.intern("e2").unwrap();

        let scores = FlatNodeCorrScores {
            scores: vec![1.0, f64::NAN],
        };

        let mut buf = Vec::new();
        write_scores(&mut buf, &registry, &scores).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "e1\t1\ne2\tNaN\n");
    }
}
