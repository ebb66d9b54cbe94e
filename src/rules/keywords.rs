//! Default seed keyword list.
//!
//! Field names that turn up verbatim in Spanish administrative forms. The
//! keyword rule reports the keyword itself whenever a block contains it,
//! case-insensitively. The list is a seed, not a vocabulary: callers can pass
//! their own through `Options::keywords`.

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Número de expediente",
    "Número expediente",
    "Nombre del representante",
    "N.I.F.",
    "Empresa",
    "Razón social",
    "C.I.F.",
    "D.N.I.",
    "Don/Doña",
    "Apoderado",
    "Poderdante",
    "Declaración responsable",
    "Expediente",
    "Firma",
    "Teléfono",
    "Correo electrónico",
    "Provincia",
    "Localidad",
    "Código postal",
];
