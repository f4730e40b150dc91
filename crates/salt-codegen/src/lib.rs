//! LLVM IR emission for the Salt programming language (spec §2 component
//! G), grounded in the teacher's `mesh-codegen/src/codegen/mod.rs`
//! `CodeGen<'ctx>` struct but over this language's single-pass, already
//! type-resolved AST instead of monomorphized MIR.

mod conversion;
mod expr;
pub mod types;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine, TargetTriple,
};
use inkwell::values::{FunctionValue, PointerValue};
use inkwell::OptimizationLevel;
use rustc_hash::FxHashMap;
use std::path::Path;

use salt_common::{Diagnostic, FatalError, Position};
use salt_parser::{Declaration, Expr, Function, Item, Program};
use salt_types::{TypeInstance, RETURN};

use types::llvm_fn_type;

/// The LLVM code generation context for one source file's worth of
/// declarations and functions (spec §4.G "IR Emitter").
pub struct Emitter<'ctx> {
    pub(crate) context: &'ctx Context,
    pub(crate) module: Module<'ctx>,
    pub(crate) builder: Builder<'ctx>,
    pub(crate) target_machine: TargetMachine,

    /// Declared signatures, extern or defined-with-body alike, keyed by
    /// name -- mirrors the parser's `FunctionTable` (spec §3
    /// `named_functions`) so call-site arity/return-type lookups don't
    /// need to re-walk the AST.
    pub(crate) declarations: FxHashMap<String, Declaration>,
    pub(crate) functions: FxHashMap<String, FunctionValue<'ctx>>,

    /// Stack-slot allocas for the current function's locals (spec §3
    /// `named_values`, IR-emitter side: "name -> stack-slot handle").
    /// Flat, not scope-stacked, because `salt-parser` has already
    /// resolved every name reference against its own scope stack; by
    /// codegen time each name in a given function is unambiguous.
    pub(crate) locals: FxHashMap<String, PointerValue<'ctx>>,
    pub(crate) local_types: FxHashMap<String, TypeInstance>,

    pub(crate) current_fn: Option<FunctionValue<'ctx>>,
    pub(crate) current_return_type: TypeInstance,

    /// Whether a function named `main` has been compiled (spec §4.F step
    /// 7 "mark the entry-point-seen flag"; spec §12 "require that an
    /// entry-point function was defined").
    pub(crate) entry_point_seen: bool,

    pub diagnostics: Vec<Diagnostic>,
}

impl<'ctx> Emitter<'ctx> {
    /// Create a new `Emitter`, initializing the native target and a
    /// target machine at the requested optimization level (spec §4.G,
    /// grounded in `mesh-codegen::CodeGen::new`).
    pub fn new(
        context: &'ctx Context,
        module_name: &str,
        opt_level: u8,
        target_triple: Option<&str>,
    ) -> Result<Self, FatalError> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(|e| FatalError::from(format!("failed to initialize native target: {e}")))?;

        let triple = match target_triple {
            Some(t) => TargetTriple::create(t),
            None => TargetMachine::get_default_triple(),
        };
        let target = Target::from_triple(&triple)
            .map_err(|e| FatalError::from(format!("invalid target triple '{triple}': {e}")))?;

        let opt = match opt_level {
            0 => OptimizationLevel::None,
            1 => OptimizationLevel::Less,
            _ => OptimizationLevel::Default,
        };

        let target_machine = target
            .create_target_machine(&triple, "generic", "", opt, RelocMode::PIC, CodeModel::Default)
            .ok_or_else(|| FatalError::from(format!("failed to create a target machine for '{triple}'")))?;

        let module = context.create_module(module_name);
        module.set_triple(&triple);
        let builder = context.create_builder();

        Ok(Emitter {
            context,
            module,
            builder,
            target_machine,
            declarations: FxHashMap::default(),
            functions: FxHashMap::default(),
            locals: FxHashMap::default(),
            local_types: FxHashMap::default(),
            current_fn: None,
            current_return_type: TypeInstance::simple(&RETURN),
            entry_point_seen: false,
            diagnostics: Vec::new(),
        })
    }

    /// Compile a whole parsed program (spec §4.F steps 1-7, §4.G "Module
    /// verification"). Grounded in `CodeGen::compile`'s declare-then-define
    /// two-pass shape.
    pub fn compile_program(&mut self, program: &Program) -> Result<(), FatalError> {
        for item in &program.items {
            let decl = match item {
                Item::Extern(decl) => decl,
                Item::Function(func) => &func.decl,
            };
            self.declare_function(decl)?;
        }

        for item in &program.items {
            if let Item::Function(func) = item {
                self.compile_function(func)?;
            }
        }

        self.module
            .verify()
            .map_err(|e| FatalError::from(format!("LLVM module verification failed: {e}")))?;

        Ok(())
    }

    /// Whether `compile_program` has seen a function named `main` (spec
    /// §4.F step 7 / §4.H "require that an entry-point function was
    /// defined").
    pub fn entry_point_seen(&self) -> bool {
        self.entry_point_seen
    }

    fn declare_function(&mut self, decl: &Declaration) -> Result<(), FatalError> {
        if self.declarations.contains_key(&decl.name) {
            // `salt-parser` already diagnosed redefinitions against its
            // own function table; a second declaration reaching codegen
            // for the same name is the same symbol seen twice (e.g. an
            // `extern` matching a `fn` of the same name), so silently
            // keep the first one rather than re-declaring the LLVM
            // function value.
            return Ok(());
        }
        let param_types: Vec<TypeInstance> = decl.params.iter().map(|p| p.ty).collect();
        let fn_type = llvm_fn_type(self.context, &param_types, decl.return_type);
        let fn_value = self.module.add_function(&decl.name, fn_type, None);
        for (i, param) in decl.params.iter().enumerate() {
            if let Some(arg) = fn_value.get_nth_param(i as u32) {
                arg.set_name(&param.name);
            }
        }
        self.declarations.insert(decl.name.clone(), decl.clone());
        self.functions.insert(decl.name.clone(), fn_value);
        Ok(())
    }

    /// Compile one function's body (spec §4.F steps 2-7, grounded in
    /// `CodeGen::compile_function`'s entry-block-alloca-per-parameter
    /// pattern).
    fn compile_function(&mut self, func: &Function) -> Result<(), FatalError> {
        let fn_value = *self
            .functions
            .get(&func.decl.name)
            .expect("every Function was declared by declare_function in the first pass");

        self.locals.clear();
        self.local_types.clear();
        self.current_fn = Some(fn_value);
        self.current_return_type = func.decl.return_type;

        let entry = self.context.append_basic_block(fn_value, "entry");
        self.builder.position_at_end(entry);

        for (i, param) in func.decl.params.iter().enumerate() {
            let arg = fn_value
                .get_nth_param(i as u32)
                .expect("declare_function created one LLVM parameter per Salt parameter");
            let alloca = self.build_entry_alloca(fn_value, &param.name, param.ty)?;
            self.builder
                .build_store(alloca, arg)
                .map_err(|e| FatalError::from(e.to_string()))?;
            self.locals.insert(param.name.clone(), alloca);
            self.local_types.insert(param.name.clone(), param.ty);
        }

        let mut last: Option<salt_types::TypeInstance> = None;
        for stmt in &func.body {
            self.codegen_expr(stmt)?;
            last = Some(stmt.ty());
        }

        if self.builder.get_insert_block().and_then(|b| b.get_terminator()).is_none() {
            self.emit_implicit_return(func, last)?;
        }

        if func.decl.name == "main" {
            self.entry_point_seen = true;
        }

        let mut err = String::new();
        if !fn_value.verify(false) {
            fn_value.print_to_string();
            err = format!("function '{}' failed LLVM verification", func.decl.name);
        }
        if !err.is_empty() {
            return Err(FatalError::from(err));
        }

        self.current_fn = None;
        Ok(())
    }

    /// A function whose body falls off the end without an explicit
    /// `return` (spec §4.F step 6 "If the function falls off the end...")
    /// gets a synthesized terminator: `ret void` for a `void`-returning
    /// function, otherwise a poison return plus a diagnostic (grounded in
    /// `original_source/src/frontend/ast.cpp`'s `CreateRetVoid`/poison-
    /// return-with-warning pair).
    fn emit_implicit_return(&mut self, func: &Function, _last: Option<TypeInstance>) -> Result<(), FatalError> {
        let ret_ty = func.decl.return_type;
        if !ret_ty.is_pointer() && matches!(ret_ty.ty.kind, salt_types::PrimitiveKind::Void) {
            self.builder.build_return(None).map_err(|e| FatalError::from(e.to_string()))?;
        } else {
            self.diagnostics.push(Diagnostic::warning(
                Position::new(func.decl.line, func.decl.column),
                format!("'{}' does not end with a return instruction", func.decl.name),
            ));
            let poison = self.poison_value(ret_ty);
            self.builder.build_return(Some(&poison)).map_err(|e| FatalError::from(e.to_string()))?;
        }
        Ok(())
    }

    /// A stack-slot alloca placed at the *start* of the entry block
    /// regardless of the builder's current insertion point (spec §3
    /// "Stack slot"), so later allocas never shadow earlier ones and the
    /// optimizer can always promote them to SSA registers. Grounded in
    /// `mesh-codegen::CodeGen::build_entry_alloca`.
    pub(crate) fn build_entry_alloca(
        &self,
        fn_value: FunctionValue<'ctx>,
        name: &str,
        ty: TypeInstance,
    ) -> Result<PointerValue<'ctx>, FatalError> {
        let entry = fn_value.get_first_basic_block().expect("compile_function creates the entry block first");
        let temp_builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first_instr) => temp_builder.position_before(&first_instr),
            None => temp_builder.position_at_end(entry),
        }
        temp_builder
            .build_alloca(types::llvm_basic_type(self.context, ty), name)
            .map_err(|e| FatalError::from(e.to_string()))
    }

    /// Emit the module as a native object file (spec §4.H, grounded in
    /// `mesh-codegen::CodeGen::emit_object`).
    pub fn emit_object(&self, path: &Path) -> Result<(), FatalError> {
        self.target_machine
            .write_to_file(&self.module, FileType::Object, path)
            .map_err(|e| FatalError::from(format!("failed to emit object file: {e}")))
    }

    /// The module's LLVM IR as text (spec §12 `--dbv`/`--dbo`), grounded
    /// in `mesh-codegen::CodeGen::get_llvm_ir`.
    pub fn get_llvm_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }
}
