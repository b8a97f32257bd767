use chrono::{NaiveDateTime, Timelike};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Textual form of `vendas.data_venda`; lexical order equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a timestamp in the stored form, dropping sub-second precision.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.with_nanosecond(0).unwrap_or(ts).format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
}

/// Sale fact (`vendas`)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Sale timestamp in [`TIMESTAMP_FORMAT`]
    #[sea_orm(column_name = "data_venda")]
    pub sold_at: String,

    /// Free-text customer name; not a dimension table
    #[sea_orm(column_name = "cliente")]
    pub customer: String,

    #[sea_orm(column_name = "produto_id")]
    pub product_id: i32,

    #[sea_orm(column_name = "quantidade")]
    pub quantity: i32,

    #[sea_orm(column_name = "forma_pagamento_id")]
    pub payment_method_id: i32,

    #[sea_orm(column_name = "preco_unitario", column_type = "Double")]
    pub unit_price: Decimal,

    /// Authoritative monetary value of the sale; never recomputed from quantity * unit price
    #[sea_orm(column_name = "valor_total", column_type = "Double")]
    pub total_value: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::payment_method::Entity",
        from = "Column::PaymentMethodId",
        to = "super::payment_method::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    PaymentMethod,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::payment_method::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMethod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn stored_form_has_no_fraction() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_milli_opt(14, 30, 0, 750)
            .unwrap();
        assert_eq!(format_timestamp(ts), "2024-01-05 14:30:00");
        assert_eq!(
            parse_timestamp("2024-01-05 14:30:00").unwrap(),
            ts.with_nanosecond(0).unwrap()
        );
    }
}
