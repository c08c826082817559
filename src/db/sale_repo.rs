// src/db/sale_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::sale::{NewProduct, PaymentType, Product, Sale, SaleWithClient},
};

const SALE_COLUMNS: &str = r#"
    s.id, s.user_id, s.client_id, s.date, s.total, s.payment_type, s.installment_count,
    s.created_at, s.updated_at
"#;

#[derive(Clone, Default)]
pub struct SaleRepository;

impl SaleRepository {
    pub fn new() -> Self {
        Self
    }

    /// Vendas do usuário com o nome do cliente, mais recentes primeiro.
    /// Filtros opcionais: cliente e intervalo (inclusivo) da data da venda.
    pub async fn list_with_client<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        client_id: Option<i64>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<SaleWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {}, c.name AS client_name
            FROM sales s
            INNER JOIN clients c ON c.id = s.client_id
            WHERE s.user_id = $1
              AND ($2::BIGINT IS NULL OR s.client_id = $2)
              AND ($3::DATE IS NULL OR s.date >= $3)
              AND ($4::DATE IS NULL OR s.date <= $4)
            ORDER BY s.date DESC, s.id DESC
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, SaleWithClient>(&sql)
            .bind(user_id)
            .bind(client_id)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(executor)
            .await?;
        Ok(sales)
    }

    pub async fn find_with_client<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        id: i64,
    ) -> Result<Option<SaleWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {}, c.name AS client_name
            FROM sales s
            INNER JOIN clients c ON c.id = s.client_id
            WHERE s.id = $1 AND s.user_id = $2
            "#,
            SALE_COLUMNS
        );
        let sale = sqlx::query_as::<_, SaleWithClient>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn insert_sale<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        client_id: i64,
        date: NaiveDate,
        total: i64,
        payment_type: PaymentType,
        installment_count: i32,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (user_id, client_id, date, total, payment_type, installment_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, client_id, date, total, payment_type, installment_count,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(client_id)
        .bind(date)
        .bind(total)
        .bind(payment_type)
        .bind(installment_count)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn insert_product<'e, E>(&self, executor: E, sale_id: i64, product: &NewProduct) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (sale_id, description, price, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sale_id, description, price, quantity, created_at
            "#,
        )
        .bind(sale_id)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.quantity)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn list_products<'e, E>(&self, executor: E, sale_id: i64) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sale_id, description, price, quantity, created_at
            FROM products
            WHERE sale_id = $1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn delete_products<'e, E>(&self, executor: E, sale_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE sale_id = $1")
            .bind(sale_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove apenas a linha da venda. Produtos e parcelas devem ter sido removidos
    /// antes, na mesma transação.
    pub async fn delete_sale<'e, E>(&self, executor: E, user_id: i64, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sales WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
