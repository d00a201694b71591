// src/utils/report.rs

use crate::physics::single_cell::SingleCell3D;

/// Text overview of an assembly: cell, K selection, particle types, stale stages
pub fn assembly_summary(sc: &SingleCell3D) -> String {
    let mut out = String::new();
    let cell = sc.cell();
    out.push_str(&format!("Scale: {}\n", cell.scale));
    for (i, a) in sc.lattice_vectors().iter().enumerate() {
        out.push_str(&format!(
            "a{}: {:>10.4} {:>10.4} {:>10.4}\n",
            i + 1,
            a.x,
            a.y,
            a.z
        ));
    }
    out.push_str(&format!(
        "Kmax: {:.4}  (ndiv = {}, dK = {})\n",
        sc.k_max(),
        sc.ndiv(),
        sc.dk()
    ));
    out.push_str(&format!("K points: {}\n", sc.k_points().len()));
    out.push_str("--------------------------------------------------\n");
    out.push_str(&format!(
        "{:<12} {:<8} {:<18} {:<8}\n",
        "Type", "Count", "Form factor", "Active"
    ));
    out.push_str("--------------------------------------------------\n");

    for name in sc.ptypes() {
        if let Ok(p) = sc.ptype(name) {
            let ff = p
                .form_factor
                .as_ref()
                .map(|ff| ff.kind().name())
                .unwrap_or("-");
            out.push_str(&format!(
                "{:<12} {:<8} {:<18} {:<8}\n",
                p.name,
                p.len(),
                ff,
                if p.active { "yes" } else { "no" }
            ));
        }
    }

    let stale: Vec<String> = sc
        .validity()
        .flags()
        .iter()
        .filter(|(_, valid)| !valid)
        .map(|(stage, _)| stage.to_string())
        .collect();
    if stale.is_empty() {
        out.push_str("All stages up to date.\n");
    } else {
        out.push_str(&format!("Stale: {}\n", stale.join(", ")));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;
    use crate::physics::form_factor::FormFactor;

    #[test]
    fn test_summary_lists_types_and_stale_stages() {
        let mut sc = SingleCell3D::new(Cell::cubic(1.0), 16, 0.01, 1800.0).unwrap();
        sc.add_ptype("A").unwrap();
        sc.set_form_factor("A", FormFactor::sphere()).unwrap();
        sc.add_ptype("B").unwrap();

        let text = assembly_summary(&sc);
        assert!(text.contains("K points: 1\n"));
        assert!(text.contains("A            0        Sphere             no"));
        assert!(text.contains("B            0        -"));
        assert!(text.ends_with("Stale: FT\n"));

        sc.calculate().unwrap();
        assert!(assembly_summary(&sc).ends_with("All stages up to date.\n"));
    }
}
