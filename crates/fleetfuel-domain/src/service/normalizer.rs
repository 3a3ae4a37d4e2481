//! Column name normalization
//!
//! Every input spreadsheet arrives with its own spelling of the same columns
//! ("Placa/Patente", "PATENTE", "Distancia [km]" ...). Each source gets an
//! explicit alias table; headers are compared after folding case, accents,
//! whitespace and punctuation away.

use fleetfuel_types::{Error, InputSource, Result};

use crate::model::Table;

pub const COL_IDENTIFIER: &str = "PATENTE";
pub const COL_LITERS: &str = "LITROS";
pub const COL_DISTANCE: &str = "KM_RECORRIDOS";
pub const COL_THEORETICAL_RATE: &str = "LITROS_100KM";
pub const COL_MODEL: &str = "MODELO";

/// Accepted spellings for one canonical column, in precedence order.
///
/// The first alias is always the canonical name itself.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAlias {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

/// Alias set for one input source
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub input: InputSource,
    pub columns: &'static [ColumnAlias],
}

pub static CONSUMPTION_ALIASES: AliasTable = AliasTable {
    input: InputSource::Consumption,
    columns: &[
        ColumnAlias {
            canonical: COL_IDENTIFIER,
            aliases: &[
                "PATENTE",
                "IDENTIFICACIONTARJETA",
                "DOMINIO",
                "PLACA/PATENTE",
                "PLACA",
            ],
            required: true,
        },
        ColumnAlias {
            canonical: COL_LITERS,
            aliases: &["LITROS", "LITROS UNIDADES", "CANTIDAD LITROS", "LTS"],
            required: true,
        },
    ],
};

pub static DISTANCE_ALIASES: AliasTable = AliasTable {
    input: InputSource::Distance,
    columns: &[
        ColumnAlias {
            canonical: COL_IDENTIFIER,
            aliases: &["PATENTE", "PLACA/PATENTE", "DOMINIO", "PLACA"],
            required: true,
        },
        ColumnAlias {
            canonical: COL_DISTANCE,
            aliases: &[
                "KM_RECORRIDOS",
                "DISTANCIA [KM]",
                "DISTANCIA",
                "KILOMETROS",
                "KM",
            ],
            required: true,
        },
    ],
};

pub static REFERENCE_ALIASES: AliasTable = AliasTable {
    input: InputSource::Reference,
    columns: &[
        ColumnAlias {
            canonical: COL_IDENTIFIER,
            aliases: &["PATENTE", "DOMINIO", "PLACA/PATENTE", "PLACA"],
            required: true,
        },
        ColumnAlias {
            canonical: COL_THEORETICAL_RATE,
            aliases: &[
                "LITROS_100KM",
                "LITROS/100KM",
                "L/100KM",
                "CONSUMO TEORICO",
                "CONSUMO_TEORICO_L_100KM",
                "LITROS",
            ],
            required: true,
        },
        ColumnAlias {
            canonical: COL_MODEL,
            aliases: &["MODELO", "MODEL", "MARCA/MODELO"],
            required: false,
        },
    ],
};

pub const COL_DEPARTURE: &str = "SALIDA";
pub const COL_CLIENT: &str = "CLIENTE";
pub const COL_MATERIAL: &str = "MATERIAL";
pub const COL_CARRIER: &str = "FLETERO";
pub const COL_DELIVERY_NOTE: &str = "REMITO";
pub const COL_FULFILLED: &str = "CUMPLIDO";
pub const COL_SETTLED: &str = "RENDIDO";
pub const COL_TONNES: &str = "TN_FACTU";
pub const COL_VALUATION: &str = "VALORIZACION";
pub const COL_BUSINESS_UNIT: &str = "U_NEGOCIO";
pub const COL_PURCHASE_VOUCHER: &str = "COMP_COMPRA";
pub const COL_SALES_VOUCHER: &str = "COMP_VENTA";
pub const COL_SERVICE_ORDER: &str = "ORD_SERVICIO";

const fn required(canonical: &'static str, aliases: &'static [&'static str]) -> ColumnAlias {
    ColumnAlias {
        canonical,
        aliases,
        required: true,
    }
}

const fn optional(canonical: &'static str, aliases: &'static [&'static str]) -> ColumnAlias {
    ColumnAlias {
        canonical,
        aliases,
        required: false,
    }
}

pub static LOGISTICS_ALIASES: AliasTable = AliasTable {
    input: InputSource::Logistics,
    columns: &[
        required(COL_DEPARTURE, &["SALIDA"]),
        required(COL_CLIENT, &["CLIENTE"]),
        required(COL_MATERIAL, &["MATERIAL", "CARGA/MATERIAL"]),
        required(COL_CARRIER, &["FLETERO", "TRANSPORTE/FLETERO"]),
        required(COL_DELIVERY_NOTE, &["REMITO", "REMITOS"]),
        required(COL_FULFILLED, &["CUMPLIDO"]),
        required(COL_SETTLED, &["RENDIDO"]),
        required(COL_TONNES, &["TN_FACTU", "TNFACTURADA", "CANT FACTURAR", "NETO SALIDA"]),
        required(COL_VALUATION, &["VALORIZACION", "TOTAL VAL. CLIENTES", "TARIFA CLIENTE"]),
        optional(COL_BUSINESS_UNIT, &["U_NEGOCIO"]),
        optional(COL_PURCHASE_VOUCHER, &["COMP_COMPRA"]),
        optional(COL_SALES_VOUCHER, &["COMP_VENTA"]),
        optional(COL_SERVICE_ORDER, &["ORD_SERVICIO", "ORDENSERVICIO", "OS"]),
    ],
};

/// Fold a header to uppercase ASCII alphanumerics ("Distancia [km]" -> "DISTANCIAKM")
pub fn fold_header(raw: &str) -> String {
    raw.chars()
        .map(fold_accent)
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_uppercase())
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'A',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' | 'Ñ' => 'N',
        _ => c,
    }
}

/// Find the column index claimed by each canonical column.
///
/// Canonical columns are resolved in alias-table order; within one canonical
/// column aliases are tried in order and the first unclaimed header wins.
pub fn resolve_columns(headers: &[String], aliases: &AliasTable) -> Vec<(&'static str, Option<usize>)> {
    let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();
    let mut claimed = vec![false; folded.len()];
    let mut resolved = Vec::with_capacity(aliases.columns.len());

    for column in aliases.columns {
        let mut hit = None;
        'aliases: for alias in column.aliases {
            let key = fold_header(alias);
            for (idx, header) in folded.iter().enumerate() {
                if !claimed[idx] && *header == key {
                    hit = Some(idx);
                    break 'aliases;
                }
            }
        }
        if let Some(idx) = hit {
            claimed[idx] = true;
        }
        resolved.push((column.canonical, hit));
    }

    resolved
}

/// Rename matching columns to their canonical names.
///
/// Fails with `Error::MissingColumn` when a required column has no match.
/// Unmatched columns keep their names and every column keeps its position.
pub fn normalize_columns(mut table: Table, aliases: &AliasTable) -> Result<Table> {
    let resolved = resolve_columns(&table.headers, aliases);

    for (column, (canonical, hit)) in aliases.columns.iter().zip(resolved) {
        match hit {
            Some(idx) => table.headers[idx] = canonical.to_string(),
            None if column.required => {
                return Err(Error::MissingColumn {
                    input: aliases.input,
                    column: canonical.to_string(),
                })
            }
            None => {}
        }
    }

    Ok(table)
}
