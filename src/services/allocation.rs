// src/services/allocation.rs
//
// Distribuição do total da venda entre as parcelas, sempre em centavos inteiros.

use crate::common::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub amounts: Vec<i64>,
    pub allocated: i64,
    pub remaining: i64,
    pub balanced: bool,
}

/// Divide `amount` em `parts` partes cuja soma é exatamente `amount`.
/// Os centavos que sobram vão para as primeiras partes: 1000 / 3 = [334, 333, 333].
pub fn split_evenly(amount: i64, parts: usize) -> Vec<i64> {
    if parts == 0 {
        return Vec::new();
    }
    let n = parts as i64;
    let base = amount / n;
    let extra = (amount % n) as usize;
    (0..parts)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

/// Recalcula as parcelas depois de uma edição do usuário.
///
/// * `slots[i] == None` (ou zero, fora a parcela editada) é uma parcela vazia.
/// * Se sobra saldo, ele é dividido igualmente entre as vazias.
/// * Se o preenchido já passa do total, a parcela editada é limitada a
///   `max(0, total - soma das outras)` e as vazias ficam zeradas.
///
/// A soma resultante nunca passa de `total`.
pub fn allocate_installments(total: i64, slots: &[Option<i64>], edited: Option<usize>) -> Allocation {
    let total = total.max(0);
    let edited = edited.filter(|&i| i < slots.len());

    let is_empty = |i: usize| Some(i) != edited && slots[i].is_none_or(|a| a <= 0);

    // Nenhuma parcela sozinha passa do total; assim as somas abaixo não estouram
    let mut amounts: Vec<i64> = slots.iter().map(|s| s.unwrap_or(0).clamp(0, total)).collect();
    let empties: Vec<usize> = (0..slots.len()).filter(|&i| is_empty(i)).collect();
    for &i in &empties {
        amounts[i] = 0;
    }

    let filled = wide_sum(&amounts);
    let remaining = i128::from(total) - filled;

    if remaining > 0 && !empties.is_empty() {
        // 0 < remaining <= total, cabe em i64
        let remaining = remaining as i64;
        for (&i, share) in empties.iter().zip(split_evenly(remaining, empties.len())) {
            amounts[i] = share;
        }
    } else if remaining < 0 {
        let target = edited.or_else(|| (0..amounts.len()).rev().find(|&i| amounts[i] > 0));
        if let Some(target) = target {
            let others = filled - i128::from(amounts[target]);
            amounts[target] = (i128::from(total) - others).max(0) as i64;
        }

        // As outras parcelas sozinhas já passam do total: corta de trás para frente
        let mut excess = wide_sum(&amounts) - i128::from(total);
        for i in (0..amounts.len()).rev() {
            if excess <= 0 {
                break;
            }
            if Some(i) == target {
                continue;
            }
            let cut = i128::from(amounts[i]).min(excess);
            amounts[i] -= cut as i64;
            excess -= cut;
        }
    }

    // Depois do ajuste a soma é <= total
    let allocated = wide_sum(&amounts) as i64;
    Allocation {
        amounts,
        allocated,
        remaining: total - allocated,
        balanced: allocated == total,
    }
}

fn wide_sum(amounts: &[i64]) -> i128 {
    amounts.iter().map(|&a| i128::from(a)).sum()
}

/// Regra de envio: a soma das parcelas deve ser exatamente igual ao total.
/// Soma que não cabe em i64 é rejeitada como fora do intervalo.
pub fn ensure_balanced(total: i64, amounts: &[i64]) -> Result<(), AppError> {
    let actual = amounts
        .iter()
        .try_fold(0i64, |acc, &amount| acc.checked_add(amount))
        .ok_or_else(|| AppError::invalid("installments", "out_of_range"))?;
    if actual != total {
        return Err(AppError::InstallmentSumMismatch { expected: total, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_exact_sum() {
        assert_eq!(split_evenly(1000, 3), vec![334, 333, 333]);
        assert_eq!(split_evenly(1000, 4), vec![250, 250, 250, 250]);
        assert_eq!(split_evenly(2, 3), vec![1, 1, 0]);
        assert!(split_evenly(1000, 0).is_empty());
    }

    #[test]
    fn remaining_goes_to_the_empty_slot() {
        let result = allocate_installments(1000, &[Some(300), Some(300), None], Some(1));

        assert_eq!(result.amounts, vec![300, 300, 400]);
        assert_eq!(result.allocated, 1000);
        assert!(result.balanced);
    }

    #[test]
    fn all_empty_slots_split_evenly() {
        let result = allocate_installments(1000, &[None, None, None], None);

        assert_eq!(result.amounts, vec![334, 333, 333]);
        assert!(result.balanced);
    }

    #[test]
    fn zero_counts_as_empty_except_for_the_edited_slot() {
        let result = allocate_installments(900, &[Some(300), Some(0), Some(0)], Some(0));
        assert_eq!(result.amounts, vec![300, 300, 300]);

        let result = allocate_installments(900, &[Some(0), None, None], Some(0));
        assert_eq!(result.amounts, vec![0, 450, 450]);
    }

    #[test]
    fn overshoot_clamps_the_edited_slot() {
        let result = allocate_installments(1000, &[Some(300), Some(900), None], Some(1));

        assert_eq!(result.amounts, vec![300, 700, 0]);
        assert_eq!(result.allocated, 1000);
        assert!(result.balanced);
    }

    #[test]
    fn edited_slot_clamps_to_zero_when_others_fill_the_total() {
        let result = allocate_installments(1000, &[Some(600), Some(400), Some(50)], Some(2));

        assert_eq!(result.amounts, vec![600, 400, 0]);
        assert!(result.balanced);
    }

    #[test]
    fn others_over_total_are_cut_from_the_back() {
        // Total diminuiu depois que as parcelas foram preenchidas
        let result = allocate_installments(500, &[Some(400), Some(400), Some(10)], Some(2));

        assert_eq!(result.amounts, vec![400, 100, 0]);
        assert_eq!(result.allocated, 500);
    }

    #[test]
    fn partial_state_never_exceeds_total() {
        let result = allocate_installments(1000, &[Some(200), Some(300)], Some(1));

        assert_eq!(result.amounts, vec![200, 300]);
        assert_eq!(result.remaining, 500);
        assert!(!result.balanced);
        assert!(result.allocated <= 1000);
    }

    #[test]
    fn out_of_range_edited_index_is_ignored() {
        let result = allocate_installments(1000, &[Some(300), None], Some(9));
        assert_eq!(result.amounts, vec![300, 700]);
    }

    #[test]
    fn submission_requires_exact_sum() {
        assert!(ensure_balanced(1000, &[300, 300, 400]).is_ok());

        match ensure_balanced(1000, &[300, 300, 399]) {
            Err(AppError::InstallmentSumMismatch { expected, actual }) => {
                assert_eq!(expected, 1000);
                assert_eq!(actual, 999);
            }
            other => panic!("esperava InstallmentSumMismatch, veio {:?}", other),
        }
    }

    #[test]
    fn submission_sum_overflow_is_out_of_range() {
        // Somados em i64 com wrap, estes valores dariam exatamente 1000
        let amounts = [6_148_914_691_236_517_205, 6_148_914_691_236_517_205, 6_148_914_691_236_518_206];

        match ensure_balanced(1000, &amounts) {
            Err(AppError::InvalidInput(errors)) => {
                assert_eq!(errors.get("installments").map(String::as_str), Some("out_of_range"));
            }
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }

    #[test]
    fn huge_slots_never_push_the_sum_over_total() {
        let result = allocate_installments(1000, &[Some(i64::MAX - 10), Some(i64::MAX - 10), None], Some(0));

        // Cada parcela é limitada ao total; a editada cede para a outra
        assert_eq!(result.amounts, vec![0, 1000, 0]);
        assert_eq!(result.allocated, 1000);
        assert!(result.balanced);
    }
}
