//! Oriented concatenation of contiguous edge chains (line-merge).

use geo::{Coord, LineString};

use crate::{GeomError, GeomResult};

/// Merge an ordered chain of linestrings into one, reversing members as
/// needed so consecutive endpoints coincide.  Joint coordinates are not
/// duplicated.
///
/// Fails when consecutive members share no endpoint — the chain walk
/// upstream produced a non-contiguous sequence, which is a geometry
/// invariant violation, not a recoverable condition.
pub fn line_merge(chain: &[LineString<f64>]) -> GeomResult<LineString<f64>> {
    let mut members = chain.iter().filter(|l| l.0.len() >= 2);
    let first = members.next().ok_or(GeomError::EmptyGeometry)?;

    let mut out: Vec<Coord<f64>> = first.0.clone();

    for (i, member) in members.enumerate() {
        let tail = *out.last().expect("merged line never empty");
        let head = *out.first().expect("merged line never empty");
        let m_start = member.0[0];
        let m_end = *member.0.last().expect("member has ≥ 2 coords");

        if m_start == tail {
            out.extend_from_slice(&member.0[1..]);
        } else if m_end == tail {
            out.extend(member.0[..member.0.len() - 1].iter().rev());
        } else if i == 0 && (m_start == head || m_end == head) {
            // Only the first joint may force the seed line to flip.
            out.reverse();
            if m_start == head {
                out.extend_from_slice(&member.0[1..]);
            } else {
                out.extend(member.0[..member.0.len() - 1].iter().rev());
            }
        } else {
            return Err(GeomError::ChainMerge(format!(
                "member {} shares no endpoint with the merged tail",
                i + 1
            )));
        }
    }

    out.dedup();
    if out.len() < 2 {
        return Err(GeomError::EmptyGeometry);
    }
    Ok(LineString::new(out))
}
