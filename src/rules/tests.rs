use crate::{BodyItem, Cell, DataRow, Document, Options, Paragraph, Table, detect_fields, fill_document};

fn detect(texts: &[&str]) -> Vec<String> {
    detect_fields(&Document::from_paragraphs(texts), &Options::default())
}

#[test]
fn detection_examples() {
    // Array of (expected candidates, block texts), default keyword list.
    let cases: Vec<(Vec<&str>, Vec<&str>)> = vec![
        (vec!["DNI"], vec!["DNI..........", ""]),
        (vec!["Provincia"], vec!["Provincia: ________"]),
        (vec!["D.N.I.", "DNI"], vec!["D.N.I. ___________"]),
        (vec!["Correo electrónico"], vec!["el CORREO ELECTRÓNICO del interesado"]),
        (vec!["Expediente", "Número de expediente"], vec!["Número de expediente: 2024/001"]),
        (vec!["Lugar y fecha"], vec!["Lugar y fecha", "  ", "Observaciones generales"]),
        (vec!["Firma"], vec!["Firma", "X"]),
        (vec!["Domicilio"], vec!["Domicilio:"]),
        (vec!["ABC"], vec!["ABC:"]),
        (vec![], vec!["AB:"]),
        (vec![], vec!["Hola", "texto largo de relleno"]),
        (vec![], vec![]),
        (vec!["Código postal", "Localidad"], vec!["Localidad: .....", "Código postal: ....."]),
    ];

    for (expected, input) in cases {
        let got = detect(&input);
        assert_eq!(got, expected, "input {input:?}");
    }
}

#[test]
fn keyword_and_colon_agree() {
    let options = Options { keywords: vec!["Nombre".into()], ..Options::default() };
    let doc = Document::from_paragraphs(&["Nombre:"]);
    assert_eq!(detect_fields(&doc, &options), vec!["Nombre"]);
}

#[test]
fn keyword_is_emitted_as_written_in_the_list() {
    let options = Options { keywords: vec!["Razón social".into()], ..Options::default() };
    let doc = Document::from_paragraphs(&["RAZÓN SOCIAL de la entidad solicitante"]);
    assert_eq!(detect_fields(&doc, &options), vec!["Razón social"]);
}

#[test]
fn short_unrelated_word_yields_nothing_without_keywords() {
    let options = Options { keywords: Vec::new(), ..Options::default() };
    for word in ["Sí", "casa", "Hola", "No."] {
        let doc = Document::from_paragraphs(&[word, "un párrafo bastante largo"]);
        assert!(detect_fields(&doc, &options).is_empty(), "{word}");
    }
}

#[test]
fn long_labels_are_dropped() {
    let label = "x".repeat(59);
    assert_eq!(detect(&[&format!("{label}:")]), vec![label.clone()]);
    assert!(detect(&[&format!("{label}y:")]).is_empty());
}

#[test]
fn table_cells_at_any_depth_are_scanned() {
    let deepest = Table::new(vec![vec![Cell::text("Localidad:")]]);
    let middle = Table::new(vec![vec![Cell::text("Observaciones generales").with_tables(vec![deepest])]]);
    let doc = Document::new(vec![
        BodyItem::Paragraph(Paragraph::new("Solicitud de ayuda para la empresa")),
        BodyItem::Table(Table::new(vec![
            vec![Cell::text("Nombre del representante"), Cell::text("")],
            vec![Cell::text("Otros datos de interés").with_tables(vec![middle])],
        ])),
    ]);

    assert_eq!(detect_fields(&doc, &Options::default()), vec!["Empresa", "Localidad", "Nombre del representante"]);
}

#[test]
fn document_without_patterns_is_left_alone() {
    let doc = Document::new(vec![
        BodyItem::Paragraph(Paragraph::new("Este documento no tiene campos para rellenar")),
        BodyItem::Table(Table::new(vec![vec![Cell::text("Texto libre dentro de una tabla")]])),
    ]);
    let options = Options { keywords: Vec::new(), ..Options::default() };
    assert!(detect_fields(&doc, &options).is_empty());

    let row: DataRow = [("Nombre", "Ana")].into_iter().collect();
    let filled = fill_document(&doc, &row, &options);
    assert_eq!(filled.to_json().unwrap(), doc.to_json().unwrap());
}
