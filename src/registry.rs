// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Named, typed variables exposed to the host for monitoring and tuning.
//!
//! Every variable is a reference to a word-sized cell that the control loops already read
//! atomically, so a host write is a single store and can land between any two ticks. Tunables go
//! through the validating setters on [`Tunables`]; a rejected value leaves the old one in place.
//!
//! Variables are registered during start-up and the table is locked before the loops start. The
//! host-side wire protocol that drives `get`/`set` lives outside this crate.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use heapless::Vec;
use thiserror::Error;

use crate::config::{ConfigError, Telemetry, Tunables};
use crate::sync::AtomicF32;

/// Host access rights of a variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// A typed variable value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    F32(f32),
    Bool(bool),
    U16(u16),
    U32(u32),
}

/// Validated fields of [`Tunables`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TunableField {
    Kp,
    Ki,
    Kd,
    MirrorEnable,
    PidEnable,
    IoPassthrough,
    DelaySamples,
    PeriodUs,
}

/// Where a variable lives.
#[derive(Copy, Clone, Debug)]
pub enum VarRef<'a> {
    F32(&'a AtomicF32),
    Bool(&'a AtomicBool),
    U16(&'a AtomicU16),
    U32(&'a AtomicU32),
    Tunable(&'a Tunables, TunableField),
}

impl VarRef<'_> {
    fn load(&self) -> Value {
        match *self {
            VarRef::F32(cell) => Value::F32(cell.load()),
            VarRef::Bool(cell) => Value::Bool(cell.load(Ordering::Relaxed)),
            VarRef::U16(cell) => Value::U16(cell.load(Ordering::Relaxed)),
            VarRef::U32(cell) => Value::U32(cell.load(Ordering::Relaxed)),
            VarRef::Tunable(t, field) => match field {
                TunableField::Kp => Value::F32(t.kp()),
                TunableField::Ki => Value::F32(t.ki()),
                TunableField::Kd => Value::F32(t.kd()),
                TunableField::MirrorEnable => Value::Bool(t.mirror_enable()),
                TunableField::PidEnable => Value::Bool(t.pid_enable()),
                TunableField::IoPassthrough => Value::Bool(t.io_passthrough()),
                TunableField::DelaySamples => Value::U16(t.delay_samples()),
                TunableField::PeriodUs => Value::U32(t.period_us()),
            },
        }
    }

    fn store(&self, value: Value) -> Result<(), RegistryError> {
        match (*self, value) {
            (VarRef::F32(cell), Value::F32(v)) => cell.store(v),
            (VarRef::Bool(cell), Value::Bool(v)) => cell.store(v, Ordering::Relaxed),
            (VarRef::U16(cell), Value::U16(v)) => cell.store(v, Ordering::Relaxed),
            (VarRef::U32(cell), Value::U32(v)) => cell.store(v, Ordering::Relaxed),
            (VarRef::Tunable(t, field), value) => match (field, value) {
                (TunableField::Kp, Value::F32(v)) => t.set_kp(v)?,
                (TunableField::Ki, Value::F32(v)) => t.set_ki(v)?,
                (TunableField::Kd, Value::F32(v)) => t.set_kd(v)?,
                (TunableField::MirrorEnable, Value::Bool(v)) => t.set_mirror_enable(v),
                (TunableField::PidEnable, Value::Bool(v)) => t.set_pid_enable(v),
                (TunableField::IoPassthrough, Value::Bool(v)) => t.set_io_passthrough(v),
                (TunableField::DelaySamples, Value::U16(v)) => t.set_delay_samples(v)?,
                (TunableField::PeriodUs, Value::U32(v)) => t.set_period_us(v)?,
                _ => return Err(RegistryError::TypeMismatch),
            },
            _ => return Err(RegistryError::TypeMismatch),
        }
        Ok(())
    }
}

/// One registry entry.
#[derive(Copy, Clone, Debug)]
pub struct Variable<'a> {
    pub name: &'static str,
    pub var: VarRef<'a>,
    pub access: Access,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry is full")]
    Full,
    #[error("variable name already registered")]
    Duplicate,
    #[error("registry is locked")]
    Locked,
    #[error("unknown variable")]
    UnknownVariable,
    #[error("variable is read-only")]
    ReadOnly,
    #[error("value type does not match the variable")]
    TypeMismatch,
    #[error("value rejected: {0}")]
    Config(#[from] ConfigError),
}

/// Fixed-capacity variable table.
pub struct Registry<'a, const N: usize> {
    vars: Vec<Variable<'a>, N>,
    locked: bool,
}

impl<'a, const N: usize> Registry<'a, N> {
    pub const fn new() -> Self {
        Self {
            vars: Vec::new(),
            locked: false,
        }
    }

    /// Add a variable. Names must be unique.
    pub fn register(
        &mut self,
        name: &'static str,
        var: VarRef<'a>,
        access: Access,
    ) -> Result<usize, RegistryError> {
        if self.locked {
            return Err(RegistryError::Locked);
        }
        if self.find(name).is_some() {
            return Err(RegistryError::Duplicate);
        }
        self.vars
            .push(Variable { name, var, access })
            .map_err(|_| RegistryError::Full)?;
        Ok(self.vars.len() - 1)
    }

    /// Freeze the table. Values stay readable and writable.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Index of the variable called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.name == name)
    }

    pub fn get(&self, id: usize) -> Result<Value, RegistryError> {
        self.entry(id).map(|v| v.var.load())
    }

    /// Write a variable from the host side.
    pub fn set(&self, id: usize, value: Value) -> Result<(), RegistryError> {
        let entry = self.entry(id)?;
        if entry.access == Access::ReadOnly {
            return Err(RegistryError::ReadOnly);
        }
        entry.var.store(value)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Value, RegistryError> {
        self.get(self.find(name).ok_or(RegistryError::UnknownVariable)?)
    }

    pub fn set_by_name(&self, name: &str, value: Value) -> Result<(), RegistryError> {
        self.set(self.find(name).ok_or(RegistryError::UnknownVariable)?, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable<'a>> {
        self.vars.iter()
    }

    fn entry(&self, id: usize) -> Result<&Variable<'a>, RegistryError> {
        self.vars.get(id).ok_or(RegistryError::UnknownVariable)
    }
}

impl<const N: usize> Default for Registry<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of variables added by [`register_paddle_vars`].
pub const PADDLE_VAR_COUNT: usize = 14;

/// Register the paddle's tunables and telemetry under the names the monitor expects.
pub fn register_paddle_vars<'a, const N: usize>(
    reg: &mut Registry<'a, N>,
    tunables: &'a Tunables,
    telemetry: &'a Telemetry,
) -> Result<(), RegistryError> {
    use Access::{ReadOnly, ReadWrite};

    let tunable = |field| VarRef::Tunable(tunables, field);

    reg.register("timestep [us]", tunable(TunableField::PeriodUs), ReadWrite)?;
    reg.register("motor_torque [N.m]", VarRef::F32(&telemetry.motor_torque), ReadOnly)?;
    reg.register(
        "encoder_paddle_pos [deg]",
        VarRef::F32(&telemetry.paddle_angle),
        ReadOnly,
    )?;
    reg.register("hall_voltage [V]", VarRef::F32(&telemetry.hall_voltage), ReadOnly)?;
    reg.register("peer value", VarRef::F32(&telemetry.peer_value), ReadOnly)?;
    reg.register("Kp", tunable(TunableField::Kp), ReadWrite)?;
    reg.register("Ki", tunable(TunableField::Ki), ReadWrite)?;
    reg.register("Kd", tunable(TunableField::Kd), ReadWrite)?;
    reg.register("enable PID", tunable(TunableField::PidEnable), ReadWrite)?;
    reg.register("enable mirror", tunable(TunableField::MirrorEnable), ReadWrite)?;
    reg.register("enable DIO", tunable(TunableField::IoPassthrough), ReadWrite)?;
    reg.register("DIO input", VarRef::Bool(&telemetry.dio_input), ReadOnly)?;
    reg.register("delay [samples]", tunable(TunableField::DelaySamples), ReadWrite)?;
    reg.register("tick overruns", VarRef::U32(&telemetry.overruns), ReadOnly)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_PERIOD_US, MAX_DELAY_SAMPLES};

    fn paddle<'a>(t: &'a Tunables, tel: &'a Telemetry) -> Registry<'a, 16> {
        let mut reg = Registry::new();
        register_paddle_vars(&mut reg, t, tel).unwrap();
        reg.lock();
        reg
    }

    #[test]
    fn paddle_vars_are_all_registered() {
        let (t, tel) = (Tunables::new(), Telemetry::new());
        let reg = paddle(&t, &tel);
        assert_eq!(reg.len(), PADDLE_VAR_COUNT);
        assert_eq!(
            reg.get_by_name("timestep [us]"),
            Ok(Value::U32(DEFAULT_PERIOD_US))
        );
        assert!(reg.iter().any(|v| v.name == "delay [samples]"));
    }

    #[test]
    fn writes_reach_tunables() {
        let (t, tel) = (Tunables::new(), Telemetry::new());
        let reg = paddle(&t, &tel);

        reg.set_by_name("Kp", Value::F32(0.25)).unwrap();
        reg.set_by_name("enable PID", Value::Bool(true)).unwrap();
        reg.set_by_name("delay [samples]", Value::U16(20)).unwrap();
        let v = t.load();
        assert_eq!((v.kp, v.pid_enable, v.delay_samples), (0.25, true, 20));
    }

    #[test]
    fn invalid_values_are_rejected_and_old_kept() {
        let (t, tel) = (Tunables::new(), Telemetry::new());
        let reg = paddle(&t, &tel);

        assert_eq!(
            reg.set_by_name("timestep [us]", Value::U32(10)),
            Err(RegistryError::Config(ConfigError::PeriodOutOfRange))
        );
        assert_eq!(
            reg.set_by_name("delay [samples]", Value::U16(MAX_DELAY_SAMPLES + 1)),
            Err(RegistryError::Config(ConfigError::DelayOutOfRange))
        );
        assert_eq!(t.period_us(), DEFAULT_PERIOD_US);
        assert_eq!(t.delay_samples(), 0);
    }

    #[test]
    fn read_only_and_type_checks() {
        let (t, tel) = (Tunables::new(), Telemetry::new());
        let reg = paddle(&t, &tel);

        assert_eq!(
            reg.set_by_name("hall_voltage [V]", Value::F32(1.0)),
            Err(RegistryError::ReadOnly)
        );
        assert_eq!(
            reg.set_by_name("Kp", Value::Bool(true)),
            Err(RegistryError::TypeMismatch)
        );
        assert_eq!(
            reg.get_by_name("no such thing"),
            Err(RegistryError::UnknownVariable)
        );
    }

    #[test]
    fn telemetry_is_readable() {
        let (t, tel) = (Tunables::new(), Telemetry::new());
        let reg = paddle(&t, &tel);
        tel.paddle_angle.store(12.5);
        tel.overruns.store(3, Ordering::Relaxed);

        assert_eq!(reg.get_by_name("encoder_paddle_pos [deg]"), Ok(Value::F32(12.5)));
        assert_eq!(reg.get_by_name("tick overruns"), Ok(Value::U32(3)));
    }

    #[test]
    fn locked_table_refuses_registration() {
        let cell = AtomicF32::new(0.0);
        let (t, tel) = (Tunables::new(), Telemetry::new());
        let mut reg = paddle(&t, &tel);
        assert_eq!(
            reg.register("extra", VarRef::F32(&cell), Access::ReadOnly),
            Err(RegistryError::Locked)
        );
    }

    #[test]
    fn duplicates_and_capacity() {
        let a = AtomicF32::new(0.0);
        let mut reg: Registry<'_, 2> = Registry::new();
        assert_eq!(reg.register("a", VarRef::F32(&a), Access::ReadWrite), Ok(0));
        assert_eq!(
            reg.register("a", VarRef::F32(&a), Access::ReadWrite),
            Err(RegistryError::Duplicate)
        );
        assert_eq!(reg.register("b", VarRef::F32(&a), Access::ReadWrite), Ok(1));
        assert_eq!(
            reg.register("c", VarRef::F32(&a), Access::ReadWrite),
            Err(RegistryError::Full)
        );

        reg.set(0, Value::F32(4.0)).unwrap();
        assert_eq!(reg.get(1), Ok(Value::F32(4.0)));
    }
}
