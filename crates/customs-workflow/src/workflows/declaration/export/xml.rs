use std::fmt::Write;

use super::super::domain::{Declaration, DocumentKind};

/// Render a declaration into the CEISA-style XML document.
pub fn render_xml(declaration: &Declaration) -> String {
    let root = match declaration.kind {
        DocumentKind::Peb => "DokumenPEB",
        DocumentKind::Pib => "DokumenPIB",
    };
    let (trader_tag, npwp_tag, country_tag) = match declaration.kind {
        DocumentKind::Peb => ("NamaEksportir", "NpwpEksportir", "NegaraTujuan"),
        DocumentKind::Pib => ("NamaImportir", "NpwpImportir", "NegaraAsal"),
    };
    let fields = &declaration.fields;

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(xml, "<{root}>");
    xml.push_str("  <Header>\n");
    element(&mut xml, 4, "NomorDokumen", &declaration.display_number());
    element(&mut xml, 4, "JenisDokumen", declaration.kind.code());
    element(&mut xml, 4, "Status", declaration.status.code());
    element(&mut xml, 4, "KantorPabean", &fields.customs_office);
    element(&mut xml, 4, trader_tag, &fields.trader_name);
    element(&mut xml, 4, npwp_tag, &fields.trader_npwp);
    if let Some(ppjk) = &fields.ppjk_name {
        element(&mut xml, 4, "NamaPpjk", ppjk);
    }
    element(&mut xml, 4, "PelabuhanMuat", &fields.port_of_loading);
    element(&mut xml, 4, "PelabuhanBongkar", &fields.port_of_discharge);
    element(&mut xml, 4, country_tag, &fields.counterpart_country);
    element(&mut xml, 4, "Valuta", &fields.currency);
    element(&mut xml, 4, "NilaiTotal", &format!("{:.2}", fields.total_value()));
    if let Some(lane) = fields.lane {
        element(&mut xml, 4, "Jalur", lane.label());
    }
    xml.push_str("  </Header>\n");

    xml.push_str("  <Barang>\n");
    for (index, item) in fields.items.iter().enumerate() {
        let _ = writeln!(xml, "    <Item seri=\"{}\">", index + 1);
        element(&mut xml, 6, "KodeHS", &item.hs_code);
        element(&mut xml, 6, "Uraian", &item.description);
        element(&mut xml, 6, "Jumlah", &item.quantity.to_string());
        element(&mut xml, 6, "Satuan", &item.unit);
        element(&mut xml, 6, "Nilai", &format!("{:.2}", item.value));
        xml.push_str("    </Item>\n");
    }
    xml.push_str("  </Barang>\n");
    let _ = writeln!(xml, "</{root}>");
    xml
}

fn element(xml: &mut String, indent: usize, tag: &str, value: &str) {
    let _ = writeln!(
        xml,
        "{:indent$}<{tag}>{}</{tag}>",
        "",
        escape(value),
        indent = indent
    );
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(ch),
            // XML 1.0 has no representation for other control characters.
            other if other < '\u{20}' || other == '\u{FFFE}' || other == '\u{FFFF}' => {}
            other => escaped.push(other),
        }
    }
    escaped
}
