use std::fmt::Write;

use crate::aggregate::{Histogram, Summary};

/// Plain-text digest of a Summary for the external analysis call.
///
/// Counts come with their share of the batch; at most `sample` excerpts are
/// included.
pub fn digest(summary: &Summary, sample: usize) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = render(&mut out, summary, sample);
    out
}

fn render(out: &mut String, s: &Summary, sample: usize) -> std::fmt::Result {
    writeln!(out, "Total de registros: {}", s.total)?;
    writeln!(out)?;

    section(out, "Status", &s.status, s)?;
    section(out, "Motivos", &s.reasons, s)?;
    section(out, "Módulos afetados", &s.modules, s)?;
    section(out, "Tempo de uso (meses)", &s.usage_age, s)?;
    section(out, "Concorrentes citados", &s.competitors, s)?;

    writeln!(out, "## Valores")?;
    writeln!(out, "- Solicitado: R$ {:.2}", s.requested_total)?;
    writeln!(out, "- Cancelado: R$ {:.2}", s.canceled_total)?;
    writeln!(out, "- Revertido: R$ {:.2}", s.reverted_total)?;
    writeln!(out)?;

    let shown = s.excerpts.len().min(sample);
    writeln!(out, "## Relatos ({} de {})", shown, s.excerpts.len())?;
    for e in s.excerpts.iter().take(sample) {
        write!(out, "- [{}] {}", e.status, e.reason)?;
        if !e.cause.is_empty() {
            write!(out, " | causa: {}", e.cause)?;
        }
        if !e.treatment.is_empty() {
            write!(out, " | tratativa: {}", e.treatment)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn section(out: &mut String, title: &str, hist: &Histogram, s: &Summary) -> std::fmt::Result {
    if hist.is_empty() {
        return Ok(());
    }
    writeln!(out, "## {}", title)?;
    for (label, count) in hist {
        writeln!(out, "- {}: {} ({:.1}%)", label, count, s.percent(*count))?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::process::ingest;

    #[test]
    fn digest_lists_counts_percentages_and_sample() {
        let text = "Status,Motivo,Valor / Solicitado,Causa\n\
                    Cancelado,Preço,\"R$ 100,00\",caro\n\
                    Cancelado,Suporte,\"R$ 50,00\",demora\n\
                    Revertido,Preço,\"R$ 25,50\",\n\
                    Pendente,Preço,\"R$ 1,00\",sem retorno\n";
        let summary = ingest(text, &Config::default()).expect("rows").summary;
        let d = digest(&summary, 2);

        assert!(d.starts_with("Total de registros: 4\n"));
        assert!(d.contains("- Cancelado: 2 (50.0%)"));
        assert!(d.contains("- Preço: 3 (75.0%)"));
        assert!(d.contains("- Solicitado: R$ 176.50"));
        assert!(d.contains("## Relatos (2 de 3)"));
        assert!(d.contains("| causa: caro"));
        assert!(!d.contains("sem retorno"));
        assert!(!d.contains("Concorrentes"));
    }
}
