// src/services/sale_service.rs

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sqlx::{Acquire, Executor, PgPool, Postgres};

use crate::{
    common::{clock::BusinessClock, error::AppError},
    db::{ClientRepository, InstallmentRepository, SaleRepository},
    models::{
        installment::InstallmentStatus,
        sale::{
            AllocationRequest, AllocationResponse, CreateSalePayload, NewInstallment, NewProduct, PaymentType,
            SaleDetail, SaleWithClient,
        },
    },
    services::allocation::{allocate_installments, ensure_balanced},
};

/// Venda validada e convertida para centavos, pronta para ser gravada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    pub client_id: i64,
    pub date: NaiveDate,
    pub payment_type: PaymentType,
    pub total: i64,
    pub products: Vec<NewProduct>,
    pub installments: Vec<NewInstallment>,
}

/// Valida o payload inteiro antes de tocar no banco.
///
/// * produtos: descrição não vazia, preço > 0, quantidade >= 1;
/// * total = Σ preço × quantidade (se o cliente mandou `total`, precisa bater);
/// * à vista: exatamente uma parcela sintetizada, já paga na data da venda;
/// * parcelado: parcelas com valor > 0, números únicos >= 1 e soma exatamente igual ao total.
pub fn build_sale_plan(payload: &CreateSalePayload, clock: &BusinessClock) -> Result<SalePlan, AppError> {
    let mut errors: HashMap<String, String> = HashMap::new();

    if payload.products.is_empty() {
        errors.insert("products".into(), "at_least_one_product".into());
    }

    let mut products = Vec::with_capacity(payload.products.len());
    let mut total: i64 = 0;

    for (idx, item) in payload.products.iter().enumerate() {
        let description = item.description.trim();
        if description.is_empty() {
            errors.insert(format!("products[{}].description", idx), "required".into());
        }
        if item.quantity < 1 {
            errors.insert(format!("products[{}].quantity", idx), "must_be_positive".into());
        }
        let price = match item.price.to_cents() {
            Ok(cents) if cents > 0 => cents,
            Ok(_) => {
                errors.insert(format!("products[{}].price", idx), "must_be_positive".into());
                continue;
            }
            Err(_) => {
                errors.insert(format!("products[{}].price", idx), "invalid_amount".into());
                continue;
            }
        };

        match price
            .checked_mul(i64::from(item.quantity.max(0)))
            .and_then(|line| total.checked_add(line))
        {
            Some(sum) => total = sum,
            None => {
                errors.insert("total".into(), "out_of_range".into());
            }
        }

        products.push(NewProduct {
            description: description.to_string(),
            price,
            quantity: item.quantity,
        });
    }

    // Produto inválido invalida a venda antes de qualquer conta com parcelas
    if !errors.is_empty() {
        return Err(AppError::InvalidInput(errors));
    }

    if let Some(declared) = &payload.total {
        if declared.to_cents()? != total {
            return Err(AppError::invalid("total", "does_not_match_products"));
        }
    }

    let installments = match payload.payment_type {
        PaymentType::Cash => {
            if payload.installments.as_ref().is_some_and(|list| !list.is_empty()) {
                return Err(AppError::invalid("installments", "not_allowed_for_cash"));
            }
            vec![NewInstallment {
                number: 1,
                due_date: payload.date,
                amount: total,
                status: InstallmentStatus::Paid,
                paid_at: Some(clock.start_of_day(payload.date)),
            }]
        }
        PaymentType::Installment => plan_installments(payload, total)?,
    };

    Ok(SalePlan {
        client_id: payload.client_id,
        date: payload.date,
        payment_type: payload.payment_type,
        total,
        products,
        installments,
    })
}

fn plan_installments(payload: &CreateSalePayload, total: i64) -> Result<Vec<NewInstallment>, AppError> {
    let items = payload.installments.as_deref().unwrap_or_default();
    if items.is_empty() {
        return Err(AppError::invalid("installments", "required"));
    }

    let mut errors: HashMap<String, String> = HashMap::new();
    let mut seen_numbers = HashSet::new();
    let mut planned = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let number = item.number.unwrap_or(idx as i32 + 1);
        if number < 1 {
            errors.insert(format!("installments[{}].number", idx), "must_be_positive".into());
        } else if !seen_numbers.insert(number) {
            errors.insert(format!("installments[{}].number", idx), "duplicate_number".into());
        }

        let amount = match item.amount.to_cents() {
            Ok(cents) if cents > total => {
                errors.insert(format!("installments[{}].amount", idx), "exceeds_total".into());
                continue;
            }
            Ok(cents) if cents > 0 => cents,
            Ok(_) => {
                errors.insert(format!("installments[{}].amount", idx), "must_be_positive".into());
                continue;
            }
            Err(_) => {
                errors.insert(format!("installments[{}].amount", idx), "invalid_amount".into());
                continue;
            }
        };

        planned.push(NewInstallment {
            number,
            due_date: item.due_date,
            amount,
            status: InstallmentStatus::Pending,
            paid_at: None,
        });
    }

    if !errors.is_empty() {
        return Err(AppError::InvalidInput(errors));
    }

    let amounts: Vec<i64> = planned.iter().map(|i| i.amount).collect();
    ensure_balanced(total, &amounts)?;

    Ok(planned)
}

/// Prévia de distribuição (formulário de venda). Não grava nada.
pub fn preview_allocation(request: &AllocationRequest) -> Result<AllocationResponse, AppError> {
    let total = request.total.to_cents()?;
    if total < 0 {
        return Err(AppError::invalid("total", "must_be_positive"));
    }

    let slots = request
        .amounts
        .iter()
        .map(|slot| slot.as_ref().map(|amount| amount.to_cents()).transpose())
        .collect::<Result<Vec<Option<i64>>, AppError>>()?;

    if let Some(idx) = slots.iter().position(|slot| slot.is_some_and(|amount| amount > total)) {
        return Err(AppError::invalid(&format!("amounts[{}]", idx), "exceeds_total"));
    }

    let allocation = allocate_installments(total, &slots, request.edited_index);
    Ok(AllocationResponse {
        amounts: allocation.amounts,
        allocated: allocation.allocated,
        remaining: allocation.remaining,
        balanced: allocation.balanced,
    })
}

#[derive(Clone)]
pub struct SaleService {
    sale_repo: SaleRepository,
    client_repo: ClientRepository,
    installment_repo: InstallmentRepository,
    clock: BusinessClock,
}

impl SaleService {
    pub fn new(
        sale_repo: SaleRepository,
        client_repo: ClientRepository,
        installment_repo: InstallmentRepository,
        clock: BusinessClock,
    ) -> Self {
        Self { sale_repo, client_repo, installment_repo, clock }
    }

    pub async fn list_sales<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        client_id: Option<i64>,
    ) -> Result<Vec<SaleWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.sale_repo.list_with_client(executor, user_id, client_id, None, None).await
    }

    /// Venda com produtos e parcelas
    pub async fn get_sale(&self, pool: &PgPool, user_id: i64, sale_id: i64) -> Result<SaleDetail, AppError> {
        let sale = self
            .sale_repo
            .find_with_client(pool, user_id, sale_id)
            .await?
            .ok_or(AppError::SaleNotFound)?;

        let products = self.sale_repo.list_products(pool, sale_id).await?;
        let installments = self.installment_repo.list_by_sale(pool, sale_id).await?;

        Ok(SaleDetail { sale, products, installments })
    }

    /// Cria venda, produtos e parcelas numa única transação.
    /// Qualquer `?` antes do commit descarta a transação (rollback no drop).
    pub async fn create_sale<'e, E>(&self, executor: E, user_id: i64, payload: &CreateSalePayload) -> Result<i64, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let plan = build_sale_plan(payload, &self.clock)?;

        let mut tx = executor.begin().await?;

        self.client_repo
            .find_by_id(&mut *tx, user_id, plan.client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        let sale = self
            .sale_repo
            .insert_sale(
                &mut *tx,
                user_id,
                plan.client_id,
                plan.date,
                plan.total,
                plan.payment_type,
                plan.installments.len() as i32,
            )
            .await?;

        for product in &plan.products {
            self.sale_repo.insert_product(&mut *tx, sale.id, product).await?;
        }
        for installment in &plan.installments {
            self.installment_repo.insert(&mut *tx, sale.id, installment).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Venda {} criada: cliente {}, total {}, {} parcela(s)",
            sale.id,
            plan.client_id,
            plan.total,
            plan.installments.len()
        );
        Ok(sale.id)
    }

    /// Remove a venda com seus produtos e parcelas, tudo na mesma transação.
    pub async fn delete_sale<'e, E>(&self, executor: E, user_id: i64, sale_id: i64) -> Result<(), AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.sale_repo
            .find_with_client(&mut *tx, user_id, sale_id)
            .await?
            .ok_or(AppError::SaleNotFound)?;

        self.installment_repo.delete_by_sale(&mut *tx, sale_id).await?;
        self.sale_repo.delete_products(&mut *tx, sale_id).await?;
        if !self.sale_repo.delete_sale(&mut *tx, user_id, sale_id).await? {
            return Err(AppError::SaleNotFound);
        }

        tx.commit().await?;

        tracing::info!("Venda {} removida", sale_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::money::MoneyInput;
    use crate::models::sale::{InstallmentPayload, ProductPayload};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> BusinessClock {
        BusinessClock::from_utc_offset_hours(-3).unwrap()
    }

    fn product(description: &str, price: f64, quantity: i32) -> ProductPayload {
        ProductPayload {
            description: description.to_string(),
            price: MoneyInput::Number(price),
            quantity,
        }
    }

    fn parcel(number: Option<i32>, due: NaiveDate, amount: &str) -> InstallmentPayload {
        InstallmentPayload {
            number,
            due_date: due,
            amount: MoneyInput::Text(amount.to_string()),
        }
    }

    fn payload(payment_type: PaymentType, installments: Option<Vec<InstallmentPayload>>) -> CreateSalePayload {
        CreateSalePayload {
            client_id: 7,
            date: date(2024, 3, 10),
            payment_type,
            products: vec![product("Jogo de panelas", 3.0, 2), product("Toalha", 4.0, 1)],
            installments,
            total: None,
        }
    }

    #[test]
    fn cash_sale_has_exactly_one_paid_installment() {
        let plan = build_sale_plan(&payload(PaymentType::Cash, None), &clock()).unwrap();

        assert_eq!(plan.total, 1000);
        assert_eq!(plan.installments.len(), 1);

        let only = &plan.installments[0];
        assert_eq!(only.number, 1);
        assert_eq!(only.amount, 1000);
        assert_eq!(only.status, InstallmentStatus::Paid);
        assert_eq!(only.due_date, date(2024, 3, 10));
        // Meia-noite em UTC-3
        assert_eq!(only.paid_at.unwrap().to_rfc3339(), "2024-03-10T03:00:00+00:00");
    }

    #[test]
    fn cash_sale_rejects_explicit_installments() {
        let p = payload(PaymentType::Cash, Some(vec![parcel(None, date(2024, 4, 10), "10,00")]));
        assert!(matches!(build_sale_plan(&p, &clock()), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn installment_sale_accepts_exact_sum() {
        let p = payload(
            PaymentType::Installment,
            Some(vec![
                parcel(None, date(2024, 4, 10), "3,00"),
                parcel(None, date(2024, 5, 10), "3,00"),
                parcel(None, date(2024, 6, 10), "4,00"),
            ]),
        );
        let plan = build_sale_plan(&p, &clock()).unwrap();

        let numbers: Vec<i32> = plan.installments.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(plan.installments.iter().all(|i| i.status == InstallmentStatus::Pending && i.paid_at.is_none()));
        assert_eq!(plan.installments.iter().map(|i| i.amount).sum::<i64>(), plan.total);
    }

    #[test]
    fn installment_sale_rejects_one_cent_off() {
        let p = payload(
            PaymentType::Installment,
            Some(vec![
                parcel(None, date(2024, 4, 10), "3,33"),
                parcel(None, date(2024, 5, 10), "3,33"),
                parcel(None, date(2024, 6, 10), "3,33"),
            ]),
        );
        match build_sale_plan(&p, &clock()) {
            Err(AppError::InstallmentSumMismatch { expected, actual }) => {
                assert_eq!(expected, 1000);
                assert_eq!(actual, 999);
            }
            other => panic!("esperava InstallmentSumMismatch, veio {:?}", other),
        }
    }

    #[test]
    fn installment_sale_requires_installments() {
        let p = payload(PaymentType::Installment, None);
        assert!(matches!(build_sale_plan(&p, &clock()), Err(AppError::InvalidInput(_))));

        let p = payload(PaymentType::Installment, Some(vec![]));
        assert!(matches!(build_sale_plan(&p, &clock()), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn duplicate_installment_numbers_are_rejected() {
        let p = payload(
            PaymentType::Installment,
            Some(vec![
                parcel(Some(1), date(2024, 4, 10), "5,00"),
                parcel(Some(1), date(2024, 5, 10), "5,00"),
            ]),
        );
        match build_sale_plan(&p, &clock()) {
            Err(AppError::InvalidInput(errors)) => {
                assert_eq!(errors.get("installments[1].number").map(String::as_str), Some("duplicate_number"));
            }
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }

    #[test]
    fn invalid_product_rejects_whole_sale() {
        let mut p = payload(PaymentType::Cash, None);
        p.products.push(product("  ", 1.0, 1));
        p.products.push(product("Brinde", 0.0, 1));
        p.products.push(product("Caneca", 5.0, 0));

        match build_sale_plan(&p, &clock()) {
            Err(AppError::InvalidInput(errors)) => {
                assert_eq!(errors.get("products[2].description").map(String::as_str), Some("required"));
                assert_eq!(errors.get("products[3].price").map(String::as_str), Some("must_be_positive"));
                assert_eq!(errors.get("products[4].quantity").map(String::as_str), Some("must_be_positive"));
            }
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }

    #[test]
    fn sale_without_products_is_rejected() {
        let mut p = payload(PaymentType::Cash, None);
        p.products.clear();

        match build_sale_plan(&p, &clock()) {
            Err(AppError::InvalidInput(errors)) => {
                assert_eq!(errors.get("products").map(String::as_str), Some("at_least_one_product"));
            }
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }

    #[test]
    fn declared_total_must_match_products() {
        let mut p = payload(PaymentType::Cash, None);
        p.total = Some(MoneyInput::Text("10,00".into()));
        assert!(build_sale_plan(&p, &clock()).is_ok());

        p.total = Some(MoneyInput::Text("9,99".into()));
        assert!(matches!(build_sale_plan(&p, &clock()), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn preview_fills_empty_slot() {
        let request = AllocationRequest {
            total: MoneyInput::Number(10.0),
            amounts: vec![Some(MoneyInput::Number(3.0)), Some(MoneyInput::Text("3,00".into())), None],
            edited_index: Some(1),
        };
        let response = preview_allocation(&request).unwrap();

        assert_eq!(response.amounts, vec![300, 300, 400]);
        assert_eq!(response.allocated, 1000);
        assert!(response.balanced);
    }

    #[test]
    fn installments_summing_past_i64_are_rejected() {
        // Somados em i64 com wrap, estes valores dariam exatamente R$ 10,00
        let p = payload(
            PaymentType::Installment,
            Some(vec![
                parcel(None, date(2024, 4, 10), "61489146912365172,05"),
                parcel(None, date(2024, 5, 10), "61489146912365172,05"),
                parcel(None, date(2024, 6, 10), "61489146912365182,06"),
            ]),
        );

        match build_sale_plan(&p, &clock()) {
            Err(AppError::InvalidInput(errors)) => {
                assert_eq!(errors.get("installments[0].amount").map(String::as_str), Some("exceeds_total"));
                assert_eq!(errors.get("installments[2].amount").map(String::as_str), Some("exceeds_total"));
            }
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }

    #[test]
    fn installment_above_total_is_rejected() {
        let p = payload(
            PaymentType::Installment,
            Some(vec![
                parcel(None, date(2024, 4, 10), "10,01"),
                parcel(None, date(2024, 5, 10), "0,01"),
            ]),
        );

        match build_sale_plan(&p, &clock()) {
            Err(AppError::InvalidInput(errors)) => {
                assert_eq!(errors.get("installments[0].amount").map(String::as_str), Some("exceeds_total"));
            }
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }

    #[test]
    fn preview_rejects_slot_above_total() {
        let request = AllocationRequest {
            total: MoneyInput::Number(10.0),
            amounts: vec![
                Some(MoneyInput::Text("92233720368547757,97".into())),
                Some(MoneyInput::Number(3.0)),
                None,
            ],
            edited_index: Some(0),
        };

        match preview_allocation(&request) {
            Err(AppError::InvalidInput(errors)) => {
                assert_eq!(errors.get("amounts[0]").map(String::as_str), Some("exceeds_total"));
            }
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }
}
