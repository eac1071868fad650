//! Acumulador de horas de motor
//!
//! Máquina de estados por activo que convierte una secuencia de muestras
//! `(servertime, motor encendido)` en horas de marcha acumuladas y tiempo parado
//! desde el último arranque.
//!
//! Cada intervalo entre dos muestras se atribuye al estado del motor vigente al
//! *inicio* del intervalo. El contador `acctime` del proveedor nunca se usa como
//! fuente acumulada: se reinicia por ciclo y sin aviso.

use crate::models::AccumulatorState;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Resultado de plegar una muestra en el estado
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorOutcome {
    pub state: AccumulatorState,
    pub cumulative_running_hours: f64,
    pub stopped_hours: f64,
}

impl AccumulatorOutcome {
    fn from_state(state: AccumulatorState) -> Self {
        Self {
            state,
            cumulative_running_hours: state.cumulative_running_hours,
            stopped_hours: state.stopped_hours(),
        }
    }
}

impl AccumulatorState {
    /// Plegar una muestra nueva. Función pura: no modifica `self`.
    pub fn advance(&self, sample_time: i64, engine_on: bool) -> AccumulatorOutcome {
        // Primera observación: solo se fija el punto de partida, no se pliega intervalo
        if !self.is_initialized() {
            return AccumulatorOutcome::from_state(AccumulatorState {
                last_sample_time: sample_time,
                last_engine_on: engine_on,
                ..*self
            });
        }

        // Un reloj que retrocede cuenta como intervalo 0
        let elapsed = (sample_time - self.last_sample_time).max(0);
        let mut next = *self;

        if self.last_engine_on {
            next.cumulative_running_hours += elapsed as f64 / SECONDS_PER_HOUR;
        } else if engine_on {
            // Arranque: el tiempo parado mide desde el arranque más reciente
            next.stopped_accum_seconds = 0;
        } else {
            next.stopped_accum_seconds += elapsed;
        }

        // Nunca se retrocede el punto de partida: evita plegar dos veces el mismo tramo
        next.last_sample_time = sample_time.max(self.last_sample_time);
        next.last_engine_on = engine_on;

        AccumulatorOutcome::from_state(next)
    }

    /// Override manual de las horas acumuladas.
    ///
    /// Reinicia el seguimiento de intervalos para que la próxima muestra vuelva a
    /// arrancar limpia, sin plegar un intervalo espurio.
    pub fn calibrated(&self, running_hours: f64) -> AccumulatorState {
        AccumulatorState {
            last_sample_time: 0,
            cumulative_running_hours: running_hours,
            ..*self
        }
    }

    pub fn stopped_hours(&self) -> f64 {
        self.stopped_accum_seconds as f64 / SECONDS_PER_HOUR
    }
}
