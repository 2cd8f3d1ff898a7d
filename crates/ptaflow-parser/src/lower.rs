use crate::{ParseError, Rule};
use indexmap::IndexMap;
use pest::iterators::{Pair, Pairs};
use ptaflow_core::{Constant, DataLayout, Function, InstKind, Module, Parameter, Type, Value};

/// Signature of a function as seen before any body is lowered, so calls may reference functions
/// defined further down the file.
struct Signature {
    ret: Type,
    is_definition: bool,
}

pub(crate) fn lower_module(pairs: Pairs<'_, Rule>, name: &str) -> Result<Module, ParseError> {
    let mut module = Module::new(name);
    let items: Vec<Pair<'_, Rule>> = pairs
        .flat_map(|pair| pair.into_inner())
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .collect();

    let mut signatures: IndexMap<String, Signature> = IndexMap::new();
    for item in &items {
        match item.as_rule() {
            Rule::declaration | Rule::definition => {
                let mut inner = item.clone().into_inner();
                let ret = lower_type(next(&mut inner, item)?)?;
                let global = next(&mut inner, item)?;
                let fname = name_of(&global);
                let is_definition = item.as_rule() == Rule::definition;
                match signatures.get_mut(&fname) {
                    Some(existing) if existing.is_definition && is_definition => {
                        return Err(ParseError::DuplicateFunction { name: fname });
                    }
                    Some(existing) => existing.is_definition |= is_definition,
                    None => {
                        signatures.insert(fname, Signature { ret, is_definition });
                    }
                }
            }
            _ => {}
        }
    }

    for item in items {
        match item.as_rule() {
            Rule::layout => module.layout = lower_layout(item)?,
            Rule::declaration => {
                let function = lower_declaration(item)?;
                if module
                    .get_function(&function.name)
                    .map_or(true, |existing| existing.is_declaration)
                {
                    module.add_function(function);
                }
            }
            Rule::definition => {
                let function = lower_definition(item, &signatures)?;
                module.add_function(function);
            }
            _ => {}
        }
    }

    Ok(module)
}

fn lower_layout(pair: Pair<'_, Rule>) -> Result<DataLayout, ParseError> {
    let mut layout = DataLayout::default();
    let mut align_given = false;
    for entry in pair.into_inner() {
        let line = line_of(&entry);
        let mut inner = entry.into_inner();
        let (Some(key), Some(value)) = (inner.next(), inner.next()) else {
            continue;
        };
        let amount = parse_integer(&value)? as u64;
        match key.as_str() {
            "pointer_size" => layout.pointer_size = amount,
            "pointer_align" => {
                layout.pointer_align = amount;
                align_given = true;
            }
            other => {
                return Err(ParseError::Layout {
                    key: other.to_string(),
                    line,
                })
            }
        }
    }
    if !align_given {
        layout.pointer_align = layout.pointer_size;
    }
    Ok(layout)
}

fn lower_declaration(pair: Pair<'_, Rule>) -> Result<Function, ParseError> {
    let mut inner = pair.clone().into_inner();
    let ret = lower_type(next(&mut inner, &pair)?)?;
    let name = name_of(&next(&mut inner, &pair)?);
    let mut params = Vec::new();
    if let Some(list) = inner.next() {
        for (i, ty) in list.into_inner().enumerate() {
            params.push(Parameter::new(format!("arg{}", i), lower_type(ty)?));
        }
    }
    Ok(Function::declaration(name, ret, params))
}

/// Per-body lowering state: the function under construction and its named values.
struct BodyLowering<'s> {
    function: Function,
    locals: IndexMap<String, Value>,
    signatures: &'s IndexMap<String, Signature>,
}

fn lower_definition(
    pair: Pair<'_, Rule>,
    signatures: &IndexMap<String, Signature>,
) -> Result<Function, ParseError> {
    let mut inner = pair.clone().into_inner();
    let ret = lower_type(next(&mut inner, &pair)?)?;
    let name = name_of(&next(&mut inner, &pair)?);

    let mut body = BodyLowering {
        function: Function::new(name, ret),
        locals: IndexMap::new(),
        signatures,
    };

    for part in inner {
        match part.as_rule() {
            Rule::param_list => {
                for param in part.into_inner() {
                    let line = line_of(&param);
                    let mut fields = param.into_inner();
                    let ty = lower_type(next_at(&mut fields, line)?)?;
                    let pname = name_of(&next_at(&mut fields, line)?);
                    let value = body.function.add_param(pname.clone(), ty);
                    body.define(pname, value, line)?;
                }
            }
            Rule::instruction => body.lower_instruction(part)?,
            _ => {}
        }
    }

    Ok(body.function)
}

impl BodyLowering<'_> {
    fn define(&mut self, name: String, value: Value, line: usize) -> Result<(), ParseError> {
        if self.locals.contains_key(&name) {
            return Err(ParseError::DuplicateDefinition { name, line });
        }
        self.locals.insert(name, value);
        Ok(())
    }

    fn lower_instruction(&mut self, pair: Pair<'_, Rule>) -> Result<(), ParseError> {
        let line = line_of(&pair);
        let Some(inst) = pair.into_inner().next() else {
            return Ok(());
        };
        let rule = inst.as_rule();
        let mut parts: Vec<Pair<'_, Rule>> = inst.into_inner().collect();

        let result = if parts.first().map(|first| first.as_rule()) == Some(Rule::local) {
            Some(name_of(&parts.remove(0)))
        } else {
            None
        };

        let kind = match rule {
            Rule::alloca => {
                let allocated = lower_type(take(&mut parts, line)?)?;
                InstKind::Alloca { allocated }
            }
            Rule::load => {
                let ty = lower_type(take(&mut parts, line)?)?;
                let (ptr_ty, ptr) = self.typed_value(take(&mut parts, line)?)?;
                match ptr_ty.pointee() {
                    Some(pointee) if *pointee == ty => {}
                    Some(pointee) => {
                        return Err(ParseError::Type {
                            message: format!("load of {} through a pointer to {}", ty, pointee),
                            line,
                        })
                    }
                    None => {
                        return Err(ParseError::Type {
                            message: format!("load through non-pointer of type {}", ptr_ty),
                            line,
                        })
                    }
                }
                InstKind::Load { ty, ptr }
            }
            Rule::store => {
                let (_, value) = self.typed_value(take(&mut parts, line)?)?;
                let (ptr_ty, ptr) = self.typed_value(take(&mut parts, line)?)?;
                if !ptr_ty.is_pointer() {
                    return Err(ParseError::Type {
                        message: format!("store through non-pointer of type {}", ptr_ty),
                        line,
                    });
                }
                InstKind::Store { value, ptr }
            }
            Rule::call => {
                let ret = lower_type(take(&mut parts, line)?)?;
                let callee = name_of(&take(&mut parts, line)?);
                match self.signatures.get(&callee) {
                    Some(signature) if signature.ret != ret => {
                        return Err(ParseError::Type {
                            message: format!(
                                "call to @{} expects {} but @{} returns {}",
                                callee, ret, callee, signature.ret
                            ),
                            line,
                        })
                    }
                    Some(_) => {}
                    None => return Err(ParseError::UnknownFunction { name: callee, line }),
                }
                let mut args = Vec::new();
                if let Some(list) = parts.pop() {
                    for arg in list.into_inner() {
                        args.push(self.typed_value(arg)?.1);
                    }
                }
                InstKind::Call { callee, ret, args }
            }
            Rule::other => {
                let opcode = take(&mut parts, line)?.as_str().to_string();
                let ty = lower_type(take(&mut parts, line)?)?;
                let mut operands = Vec::new();
                if let Some(list) = parts.pop() {
                    for operand in list.into_inner() {
                        operands.push(self.value(operand, &ty)?);
                    }
                }
                InstKind::Other {
                    opcode,
                    ty,
                    operands,
                }
            }
            _ => return Ok(()),
        };

        let id = self.function.push(kind, result.clone());
        if let Some(name) = result {
            self.define(name, Value::Inst(id), line)?;
        }
        Ok(())
    }

    /// `<ty> <value>`. Named values must carry the annotated type; literals take it.
    fn typed_value(&mut self, pair: Pair<'_, Rule>) -> Result<(Type, Value), ParseError> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let ty = lower_type(next_at(&mut inner, line)?)?;
        let value = self.value(next_at(&mut inner, line)?, &ty)?;
        if let Some(actual) = self.function.type_of(value) {
            if actual != ty {
                return Err(ParseError::Type {
                    message: format!(
                        "{} has type {} but is used as {}",
                        self.function.value_name(value),
                        actual,
                        ty
                    ),
                    line,
                });
            }
        }
        Ok((ty, value))
    }

    fn value(&mut self, pair: Pair<'_, Rule>, ty: &Type) -> Result<Value, ParseError> {
        let line = line_of(&pair);
        let inner = next_at(&mut pair.into_inner(), line)?;
        match inner.as_rule() {
            Rule::local => {
                let name = name_of(&inner);
                self.locals
                    .get(&name)
                    .copied()
                    .ok_or(ParseError::UndefinedValue { name, line })
            }
            Rule::integer => {
                let literal = parse_integer(&inner)?;
                Ok(self.function.intern_constant(Constant::Int(literal), ty.clone()))
            }
            Rule::null => Ok(self.function.intern_constant(Constant::Null, ty.clone())),
            _ => Ok(self.function.intern_constant(Constant::Undef, ty.clone())),
        }
    }
}

fn lower_type(pair: Pair<'_, Rule>) -> Result<Type, ParseError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let base = next_at(&mut inner, line)?;
    let mut ty = match base.as_rule() {
        Rule::void_ty => Type::Void,
        Rule::int_ty => Type::Int(bit_width(&base)?),
        Rule::float_ty => Type::Float(bit_width(&base)?),
        Rule::array_ty => {
            let mut parts = base.into_inner();
            let len = parse_integer(&next_at(&mut parts, line)?)?;
            let element = lower_type(next_at(&mut parts, line)?)?;
            Type::array_of(element, len.max(0) as u64)
        }
        Rule::struct_ty => Type::Struct(
            base.into_inner()
                .map(lower_type)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        _ => {
            return Err(ParseError::Type {
                message: format!("unexpected type `{}`", base.as_str()),
                line,
            })
        }
    };
    for _star in inner {
        ty = Type::ptr_to(ty);
    }
    Ok(ty)
}

fn bit_width(pair: &Pair<'_, Rule>) -> Result<u16, ParseError> {
    pair.as_str()[1..].parse().map_err(|_| ParseError::Type {
        message: format!("bit width of `{}` out of range", pair.as_str()),
        line: line_of(pair),
    })
}

fn parse_integer(pair: &Pair<'_, Rule>) -> Result<i64, ParseError> {
    pair.as_str().parse().map_err(|_| ParseError::Type {
        message: format!("integer literal `{}` out of range", pair.as_str()),
        line: line_of(pair),
    })
}

/// Name of a `%local` or `@global` without its sigil.
fn name_of(pair: &Pair<'_, Rule>) -> String {
    pair.clone()
        .into_inner()
        .next()
        .map(|name| name.as_str().to_string())
        .unwrap_or_else(|| pair.as_str().trim_start_matches(['%', '@']).to_string())
}

fn line_of(pair: &Pair<'_, Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn next<'i>(
    pairs: &mut Pairs<'i, Rule>,
    parent: &Pair<'i, Rule>,
) -> Result<Pair<'i, Rule>, ParseError> {
    next_at(pairs, line_of(parent))
}

fn next_at<'i>(pairs: &mut Pairs<'i, Rule>, line: usize) -> Result<Pair<'i, Rule>, ParseError> {
    pairs.next().ok_or(ParseError::Malformed { line })
}

fn take<'i>(parts: &mut Vec<Pair<'i, Rule>>, line: usize) -> Result<Pair<'i, Rule>, ParseError> {
    if parts.is_empty() {
        return Err(ParseError::Malformed { line });
    }
    Ok(parts.remove(0))
}
