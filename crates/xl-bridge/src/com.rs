//! Minimal late-bound COM layer for the bridge's operation set.
//!
//! Excel's automation surface is reached through IDispatch, VBScript-style.
//! The bridge only ever needs four call shapes - read a property, write a
//! property, look up a one-index collection member (`Item`, `Range`), and
//! invoke a zero-argument method (`Clear`, `AutoFit`, `Calculate`) - so
//! that is the whole surface [`Automation`] exposes. Values cross the
//! boundary as owned [`Variant`]s with typed constructors and accessors for
//! the handful of VTs a cell can hold.

#![cfg(windows)]

use std::mem::ManuallyDrop;
use std::ptr;

use windows::{
    core::{IUnknown, Interface, BSTR, GUID, HSTRING, PCWSTR},
    Win32::{
        Foundation::{DISP_E_EXCEPTION, VARIANT_BOOL},
        Globalization::GetSystemDefaultLCID,
        System::{
            Com::{
                CLSIDFromProgID, IDispatch, DISPATCH_FLAGS, DISPATCH_METHOD,
                DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS, EXCEPINFO,
            },
            Ole::{GetActiveObject, DISPID_PROPERTYPUT},
            Variant::{
                VARIANT, VT_BOOL, VT_BSTR, VT_DISPATCH, VT_EMPTY, VT_ERROR, VT_I2, VT_I4, VT_NULL,
                VT_R4, VT_R8,
            },
        },
    },
};

/// An owned COM VARIANT.
///
/// Construction and inspection go through typed methods; the raw windows-rs
/// union handling (ManuallyDrop fields set via `ptr::write`) stays inside
/// this type.
pub struct Variant(VARIANT);

impl Variant {
    /// VT_EMPTY - what an empty cell reads as, and what blanks one.
    pub fn empty() -> Self {
        Self(VARIANT::default())
    }

    /// VT_BOOL, using OLE's -1/0 truth values.
    pub fn from_bool(val: bool) -> Self {
        let mut v = VARIANT::default();
        unsafe {
            let inner = &mut *v.Anonymous.Anonymous;
            ptr::write(&mut inner.vt, VT_BOOL);
            ptr::write(
                &mut inner.Anonymous.boolVal,
                VARIANT_BOOL(if val { -1 } else { 0 }),
            );
        }
        Self(v)
    }

    /// VT_R8; every number in the bridge protocol is an f64.
    pub fn from_f64(val: f64) -> Self {
        let mut v = VARIANT::default();
        unsafe {
            let inner = &mut *v.Anonymous.Anonymous;
            ptr::write(&mut inner.vt, VT_R8);
            ptr::write(&mut inner.Anonymous.dblVal, val);
        }
        Self(v)
    }

    /// VT_I4 - collection indexes, packed color longs, and the
    /// `ColorIndex` sentinel.
    pub fn from_i32(val: i32) -> Self {
        let mut v = VARIANT::default();
        unsafe {
            let inner = &mut *v.Anonymous.Anonymous;
            ptr::write(&mut inner.vt, VT_I4);
            ptr::write(&mut inner.Anonymous.lVal, val);
        }
        Self(v)
    }

    /// VT_BSTR copy of a Rust string - cell text, formulas, formats, and
    /// A1 references.
    pub fn bstr(val: &str) -> Self {
        let mut v = VARIANT::default();
        unsafe {
            let inner = &mut *v.Anonymous.Anonymous;
            ptr::write(&mut inner.vt, VT_BSTR);
            ptr::write(&mut inner.Anonymous.bstrVal, ManuallyDrop::new(BSTR::from(val)));
        }
        Self(v)
    }

    /// The raw VT type tag, for diagnostics.
    pub fn vt(&self) -> u16 {
        unsafe { self.0.Anonymous.Anonymous.vt.0 }
    }

    /// True for VT_EMPTY/VT_NULL: an empty cell.
    pub fn is_empty(&self) -> bool {
        unsafe {
            let vt = self.0.Anonymous.Anonymous.vt;
            vt == VT_EMPTY || vt == VT_NULL
        }
    }

    /// True for VT_ERROR: a cell holding an error value such as `#REF!`.
    pub fn is_com_error(&self) -> bool {
        unsafe { self.0.Anonymous.Anonymous.vt == VT_ERROR }
    }

    /// Boolean payload of a VT_BOOL.
    pub fn as_bool(&self) -> Option<bool> {
        unsafe {
            if self.0.Anonymous.Anonymous.vt == VT_BOOL {
                Some(self.0.Anonymous.Anonymous.Anonymous.boolVal.0 != 0)
            } else {
                None
            }
        }
    }

    /// Numeric payload, widened to f64 from any of the numeric VTs Excel
    /// hands back (R8, R4, I4, I2).
    pub fn as_f64(&self) -> Option<f64> {
        unsafe {
            let vt = self.0.Anonymous.Anonymous.vt;
            let payload = &self.0.Anonymous.Anonymous.Anonymous;
            if vt == VT_R8 {
                Some(payload.dblVal)
            } else if vt == VT_R4 {
                Some(payload.fltVal as f64)
            } else if vt == VT_I4 {
                Some(payload.lVal as f64)
            } else if vt == VT_I2 {
                Some(payload.iVal as f64)
            } else {
                None
            }
        }
    }

    /// String payload of a VT_BSTR.
    pub fn as_string(&self) -> Option<String> {
        unsafe {
            if self.0.Anonymous.Anonymous.vt == VT_BSTR {
                Some(self.0.Anonymous.Anonymous.Anonymous.bstrVal.to_string())
            } else {
                None
            }
        }
    }

    /// Take the VT_DISPATCH payload as an [`Automation`] handle, or explain
    /// what the member returned instead.
    fn into_object(self, context: &str) -> Result<Automation, String> {
        unsafe {
            if self.0.Anonymous.Anonymous.vt == VT_DISPATCH {
                let disp: &Option<IDispatch> = &self.0.Anonymous.Anonymous.Anonymous.pdispVal;
                return disp
                    .clone()
                    .map(|inner| Automation { inner })
                    .ok_or_else(|| format!("'{context}' returned a null object"));
            }
        }
        if self.is_empty() {
            Err(format!("'{context}' returned empty/null"))
        } else {
            Err(format!(
                "'{context}' returned non-object VARIANT (VT={}), expected VT_DISPATCH",
                self.vt()
            ))
        }
    }
}

/// A late-bound handle to one automation object.
pub struct Automation {
    inner: IDispatch,
}

impl Automation {
    /// Connect to the RUNNING instance registered for a ProgID (e.g.
    /// "Excel.Application"). Does not launch anything: if the application
    /// is not running, this fails.
    pub fn live_instance(progid: &str) -> Result<Self, String> {
        unsafe {
            let hstr = HSTRING::from(progid);
            let clsid =
                CLSIDFromProgID(&hstr).map_err(|e| format!("CLSIDFromProgID failed: {e}"))?;
            let mut unknown: Option<IUnknown> = None;
            GetActiveObject(&clsid, None, &mut unknown)
                .map_err(|e| format!("no running instance of '{progid}': {e}"))?;
            let unknown =
                unknown.ok_or_else(|| format!("GetActiveObject('{progid}') returned null"))?;
            let inner: IDispatch = unknown
                .cast()
                .map_err(|e| format!("'{progid}' does not expose IDispatch: {e}"))?;
            Ok(Self { inner })
        }
    }

    /// Read a property: `obj.Name`.
    pub fn prop(&self, name: &str) -> Result<Variant, String> {
        self.invoke(name, DISPATCH_PROPERTYGET, &DISPPARAMS::default())
    }

    /// Write a property: `obj.Name = value`.
    pub fn put(&self, name: &str, value: Variant) -> Result<(), String> {
        let mut args = [value.0];
        let mut named = [DISPID_PROPERTYPUT];
        let params = DISPPARAMS {
            rgvarg: args.as_mut_ptr(),
            rgdispidNamedArgs: named.as_mut_ptr(),
            cArgs: 1,
            cNamedArgs: 1,
        };
        self.invoke(name, DISPATCH_PROPERTYPUT, &params)?;
        Ok(())
    }

    /// Read a property that is itself an object: `obj.Name` yielding
    /// `Workbooks`, `Interior`, `EntireColumn`, ...
    pub fn object(&self, name: &str) -> Result<Automation, String> {
        self.prop(name)?.into_object(name)
    }

    /// Look up a one-index collection member: `obj.Name(index)` as in
    /// `Workbooks.Item(1)`, `Worksheets.Item("Sheet1")`, `Range("A1:A5")`.
    pub fn indexed(&self, name: &str, index: Variant) -> Result<Automation, String> {
        let mut args = [index.0];
        let params = DISPPARAMS {
            rgvarg: args.as_mut_ptr(),
            rgdispidNamedArgs: ptr::null_mut(),
            cArgs: 1,
            cNamedArgs: 0,
        };
        self.invoke(name, DISPATCH_PROPERTYGET, &params)?
            .into_object(name)
    }

    /// Invoke a zero-argument method: `obj.Name()`. Everything the bridge
    /// calls (`Clear`, `AutoFit`, `Calculate`) takes no arguments, so no
    /// argument marshalling exists here.
    pub fn call(&self, name: &str) -> Result<(), String> {
        self.invoke(name, DISPATCH_METHOD, &DISPPARAMS::default())?;
        Ok(())
    }

    /// Shared `IDispatch::Invoke` plumbing: name lookup, the call itself,
    /// and EXCEPINFO-aware error reporting.
    fn invoke(
        &self,
        name: &str,
        flags: DISPATCH_FLAGS,
        params: &DISPPARAMS,
    ) -> Result<Variant, String> {
        let dispid = self.dispid(name)?;
        unsafe {
            let mut result = VARIANT::default();
            let mut except = EXCEPINFO::default();
            self.inner
                .Invoke(
                    dispid,
                    &GUID::zeroed(),
                    GetSystemDefaultLCID(),
                    flags,
                    params,
                    Some(&mut result),
                    Some(&mut except),
                    None,
                )
                .map_err(|e| describe_com_error(e, &except, name))?;
            Ok(Variant(result))
        }
    }

    /// Resolve a member name to its DISPID.
    fn dispid(&self, name: &str) -> Result<i32, String> {
        unsafe {
            let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
            let names = [PCWSTR(wide.as_ptr())];
            let mut dispid = 0i32;
            self.inner
                .GetIDsOfNames(
                    &GUID::zeroed(),
                    names.as_ptr(),
                    1,
                    GetSystemDefaultLCID(),
                    &mut dispid,
                )
                .map_err(|e| format!("GetIDsOfNames('{name}') failed: {e}"))?;
            Ok(dispid)
        }
    }
}

/// Render an Invoke failure, preferring the EXCEPINFO detail Excel fills in
/// over the bare HRESULT.
fn describe_com_error(err: windows::core::Error, except: &EXCEPINFO, member: &str) -> String {
    if err.code().0 as u32 == DISP_E_EXCEPTION.0 as u32 {
        let desc = if except.bstrDescription.is_empty() {
            String::from("(no description)")
        } else {
            except.bstrDescription.to_string()
        };
        let source = if except.bstrSource.is_empty() {
            String::from("(no source)")
        } else {
            except.bstrSource.to_string()
        };
        format!("COM exception in '{member}': {desc} (source: {source})")
    } else {
        format!("Invoke('{member}') failed: {err}")
    }
}
