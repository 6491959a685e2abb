use super::Val;
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Variable memory
///
/// A chain of frames, one per program activation. Lookups search from
/// the innermost frame outward; writes go to the innermost frame.

#[derive(Debug, Clone)]
pub struct Scope {
    frames: Vec<HashMap<Rc<str>, Val>>,
}

impl Default for Scope {
    fn default() -> Scope {
        Scope {
            frames: vec![HashMap::new()],
        }
    }
}

impl Scope {
    pub fn new() -> Scope {
        Scope::default()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.frames.push(HashMap::new());
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self) -> Result<()> {
        if self.frames.len() > u16::max_value() as usize {
            return Err(error!(OutOfMemory; "TOO MANY SCOPES"));
        }
        self.frames.push(HashMap::new());
        Ok(())
    }

    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn get(&self, var_name: &str) -> Option<&Val> {
        self.frames.iter().rev().find_map(|frame| frame.get(var_name))
    }

    pub fn fetch(&self, var_name: &Rc<str>) -> Val {
        match self.get(var_name) {
            Some(val) => val.clone(),
            None => {
                if var_name.ends_with('$') {
                    Val::String("".into())
                } else {
                    Val::Integer(0)
                }
            }
        }
    }

    /// Store with the type implied by the name: `$` names hold strings,
    /// all others hold numbers.
    pub fn store(&mut self, var_name: &Rc<str>, value: Val) -> Result<()> {
        let is_string = matches!(value, Val::String(_));
        if var_name.ends_with('$') != is_string {
            return Err(error!(TypeMismatch));
        }
        self.assign(var_name, value)
    }

    /// Store without type checking. Writes land in the innermost frame,
    /// shadowing any outer variable of the same name.
    pub fn assign(&mut self, var_name: &Rc<str>, value: Val) -> Result<()> {
        self.define(var_name, value)
    }

    /// Create or overwrite a variable in the innermost frame.
    pub fn define(&mut self, var_name: &Rc<str>, value: Val) -> Result<()> {
        let frame = match self.frames.last_mut() {
            Some(frame) => frame,
            None => return Err(error!(InternalError; "NO SCOPE")),
        };
        if frame.len() > u16::max_value() as usize {
            return Err(error!(OutOfMemory));
        }
        frame.insert(var_name.clone(), value);
        Ok(())
    }
}
