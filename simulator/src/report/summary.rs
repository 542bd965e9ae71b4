use sweepcore::{CutoffRecord, DerivedPoint};

/// Multi-line live readout of one reduced point.
pub fn point_report(point: &DerivedPoint) -> String {
    format!(
        "LO:\n\
         \x20 P_lo, dBm={lo_p}\n\
         \x20 F_lo, GHz={lo_f:.2}\n\
         \x20 P_loss, dB={loss:.2}\n\
         \x20 P_in, %={p_in:.2}\n\
         \x20 P_in, dB={p_in_db:.2}\n\
         Supply:\n\
         \x20 U, V={src_u}\n\
         \x20 I, A={src_i}\n\
         Analyzer:\n\
         \x20 P_out, dBm={p_out:.3}\n\
         \x20 P_carr, dBm={p_carr:.3}\n\
         \x20 P_sb, dBm={p_sb}\n\
         \x20 P_3h, dBm={p_3_harm}\n\
         Derived:\n\
         \x20 Kp, dB={kp}",
        lo_p = point.lo_p,
        lo_f = point.lo_f,
        loss = point.lo_p_loss,
        p_in = point.p_in,
        p_in_db = point.p_in_db,
        src_u = point.src_u,
        src_i = point.src_i,
        p_out = point.p_out,
        p_carr = point.p_carr,
        p_sb = point.p_sb,
        p_3_harm = point.p_3_harm,
        kp = point.kp,
    )
}

/// One line per LO frequency.
pub fn cutoff_table(cutoffs: &[CutoffRecord]) -> String {
    cutoffs
        .iter()
        .map(|record| {
            format!(
                "F_lo={:.3} GHz  P1dB_in={:.2} dB{}",
                record.lo_f,
                record.cutoff_input_level,
                if record.compressed { "" } else { "  (not reached)" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
