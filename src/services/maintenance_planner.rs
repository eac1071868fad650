//! Planificador de mantenimiento preventivo
//!
//! Función pura: dado el uso acumulado y el plan de un activo, calcula el próximo
//! vencimiento de cada tarea, cuánto falta y su estado, ordenado por urgencia.

use crate::models::{MaintenancePlanItem, MaintenanceStatus, TaskStatus};
use crate::utils::round2;

/// Evaluar el plan contra el uso acumulado.
///
/// Los ítems mal formados (umbral o intervalo <= 0) se saltan sin error. El
/// resultado se ordena por `(prioridad del estado, faltante)`: primero vencidas,
/// luego próximas, luego OK, y dentro de cada grupo la que menos margen tiene.
pub fn evaluate(usage: f64, plan: &[MaintenancePlanItem]) -> Vec<TaskStatus> {
    let mut tasks: Vec<TaskStatus> = plan
        .iter()
        .filter_map(|item| evaluate_item(usage, item))
        .collect();

    tasks.sort_by(|a, b| {
        a.status
            .priority()
            .cmp(&b.status.priority())
            .then(a.remaining.total_cmp(&b.remaining))
    });

    tasks
}

fn evaluate_item(usage: f64, item: &MaintenancePlanItem) -> Option<TaskStatus> {
    if !item.is_well_formed() {
        log::debug!("⏭️ Ítem de plan ignorado (umbral/intervalo inválido): {}", item.name);
        return None;
    }

    let next_due = next_due(usage, item.first_threshold, item.interval);
    let remaining = round2(next_due - usage);

    let status = if remaining <= 0.0 {
        MaintenanceStatus::Overdue
    } else if remaining <= item.warn_before {
        MaintenanceStatus::DueSoon
    } else {
        MaintenanceStatus::Ok
    };

    Some(TaskStatus {
        name: item.name.clone(),
        unit: item.unit,
        first_threshold: item.first_threshold,
        interval: item.interval,
        warn_before: item.warn_before,
        next_due: round2(next_due),
        remaining,
        status,
    })
}

/// Próximo múltiplo `first + k * interval` no superado por el uso.
///
/// Alcanzar un vencimiento exacto lo deja vencido (faltante 0) en lugar de
/// saltar al ciclo siguiente.
fn next_due(usage: f64, first_threshold: f64, interval: f64) -> f64 {
    if usage <= first_threshold {
        return first_threshold;
    }
    // Tolerancia para que 300.0000000001 cuente como el vencimiento de 300
    let cycles = ((usage - first_threshold) / interval - 1e-9).ceil().max(0.0);
    first_threshold + cycles * interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementBasis;

    fn item(name: &str, first: f64, interval: f64, warn: f64) -> MaintenancePlanItem {
        MaintenancePlanItem::new(name, MeasurementBasis::Hours, first, interval, warn)
    }

    #[test]
    fn test_due_soon_before_first_service() {
        let tasks = evaluate(95.0, &[item("oil", 100.0, 100.0, 10.0)]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].next_due, 100.0);
        assert_eq!(tasks[0].remaining, 5.0);
        assert_eq!(tasks[0].status, MaintenanceStatus::DueSoon);
    }

    #[test]
    fn test_ok_between_cycles() {
        let tasks = evaluate(250.0, &[item("oil", 100.0, 100.0, 10.0)]);
        assert_eq!(tasks[0].next_due, 300.0);
        assert_eq!(tasks[0].remaining, 50.0);
        assert_eq!(tasks[0].status, MaintenanceStatus::Ok);
    }

    #[test]
    fn test_overdue_at_threshold() {
        let tasks = evaluate(100.0, &[item("oil", 100.0, 100.0, 10.0)]);
        assert_eq!(tasks[0].next_due, 100.0);
        assert_eq!(tasks[0].remaining, 0.0);
        assert_eq!(tasks[0].status, MaintenanceStatus::Overdue);

        let tasks = evaluate(300.0, &[item("oil", 100.0, 100.0, 10.0)]);
        assert_eq!(tasks[0].next_due, 300.0);
        assert_eq!(tasks[0].status, MaintenanceStatus::Overdue);
    }

    #[test]
    fn test_next_due_never_behind_usage() {
        for usage in [0.0, 0.5, 99.99, 100.01, 187.3, 1_234.56] {
            let tasks = evaluate(usage, &[item("oil", 100.0, 100.0, 10.0)]);
            assert!(tasks[0].next_due >= usage);
            assert!(tasks[0].next_due - usage <= 100.0 + 1e-6);
        }
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let plan = vec![
            item("zero interval", 100.0, 0.0, 10.0),
            item("negative first", -5.0, 100.0, 10.0),
            item("valid", 200.0, 200.0, 10.0),
        ];
        let tasks = evaluate(50.0, &plan);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "valid");
    }

    #[test]
    fn test_sorted_by_urgency_then_remaining() {
        let plan = vec![
            item("ok far", 500.0, 500.0, 10.0),
            item("ok near", 150.0, 150.0, 10.0),
            item("overdue", 120.0, 120.0, 10.0),
            item("due soon far", 128.0, 128.0, 10.0),
            item("due soon near", 121.0, 121.0, 10.0),
            item("overdue too", 40.0, 40.0, 5.0),
        ];
        let tasks = evaluate(120.0, &plan);
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["overdue", "overdue too", "due soon near", "due soon far", "ok near", "ok far"]
        );
        let statuses: Vec<MaintenanceStatus> = tasks.iter().map(|t| t.status).collect();
        assert!(statuses.windows(2).all(|w| w[0].priority() <= w[1].priority()));
    }
}
