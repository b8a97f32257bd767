use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_categorias_table::Migration),
            Box::new(m20240101_000002_create_formas_pagamento_table::Migration),
            Box::new(m20240101_000003_create_produtos_table::Migration),
            Box::new(m20240101_000004_create_vendas_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_categorias_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_categorias_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categorias::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categorias::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Categorias::Nome)
                                .text()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categorias::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Categorias {
        Table,
        Id,
        Nome,
    }
}

mod m20240101_000002_create_formas_pagamento_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_formas_pagamento_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FormasPagamento::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FormasPagamento::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(FormasPagamento::Nome)
                                .text()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FormasPagamento::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum FormasPagamento {
        Table,
        Id,
        Nome,
    }
}

mod m20240101_000003_create_produtos_table {

    use super::m20240101_000001_create_categorias_table::Categorias;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_produtos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Produtos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Produtos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Produtos::Nome)
                                .text()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Produtos::CategoriaId).integer().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_produtos_categoria")
                                .from(Produtos::Table, Produtos::CategoriaId)
                                .to(Categorias::Table, Categorias::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Produtos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Produtos {
        Table,
        Id,
        Nome,
        CategoriaId,
    }
}

mod m20240101_000004_create_vendas_table {

    use super::m20240101_000002_create_formas_pagamento_table::FormasPagamento;
    use super::m20240101_000003_create_produtos_table::Produtos;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_vendas_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Vendas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Vendas::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        // 'YYYY-MM-DD HH:MM:SS'
                        .col(ColumnDef::new(Vendas::DataVenda).text().not_null())
                        .col(ColumnDef::new(Vendas::Cliente).text().not_null())
                        .col(ColumnDef::new(Vendas::ProdutoId).integer().not_null())
                        .col(ColumnDef::new(Vendas::Quantidade).integer().not_null())
                        .col(
                            ColumnDef::new(Vendas::FormaPagamentoId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Vendas::PrecoUnitario).double().not_null())
                        .col(ColumnDef::new(Vendas::ValorTotal).double().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendas_produto")
                                .from(Vendas::Table, Vendas::ProdutoId)
                                .to(Produtos::Table, Produtos::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendas_forma_pagamento")
                                .from(Vendas::Table, Vendas::FormaPagamentoId)
                                .to(FormasPagamento::Table, FormasPagamento::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_vendas_data_venda")
                        .table(Vendas::Table)
                        .col(Vendas::DataVenda)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Vendas::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Vendas {
        Table,
        Id,
        DataVenda,
        Cliente,
        ProdutoId,
        Quantidade,
        FormaPagamentoId,
        PrecoUnitario,
        ValorTotal,
    }
}
