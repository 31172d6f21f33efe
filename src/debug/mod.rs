//! This module decodes the DWARF debugging info found in the ".debug_info" section of
//! ELF files. Entries in that section are encoded using schemas from ".debug_abbrev"
//! and strings from ".debug_str". The format is documented here:
//! https://dwarfstd.org/doc/DWARF4.pdf. The readelf source code is also useful and can
//! be found at https://github.com/bminor/binutils-gdb/tree/master/binutils.
//!
//! The decoder is layered:
//! * leb128 - variable length integers.
//! * abbrev - per unit tables describing how entries are encoded.
//! * value - decodes one attribute value given its form.
//! * die - builds the tree of debugging information entries for a unit.
//! * unit - compilation unit headers.
//! * info - the top level DebugInfo which frames all the units in a binary.
use std::fmt;

pub mod abbrev;
pub mod die;
pub mod info;
pub mod leb128;
pub mod unit;
pub mod value;

#[cfg(test)]
pub(crate) mod test_util;

pub use abbrev::*;
pub use die::*;
pub use info::*;
pub use leb128::*;
pub use unit::*;
pub use value::*;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)] // figure 20
pub enum AttributeName {
    //                             value & class
    DW_AT_sibling,                 // 0x01 reference
    DW_AT_location,                // 0x02 exprloc, loclistptr
    DW_AT_name,                    // 0x03 string
    DW_AT_ordering,                // 0x09 constant
    DW_AT_byte_size,               // 0x0b constant, exprloc, reference
    DW_AT_bit_offset,              // 0x0c constant, exprloc, reference
    DW_AT_bit_size,                // 0x0d constant, exprloc, reference
    DW_AT_stmt_list,               // 0x10 lineptr
    DW_AT_low_pc,                  // 0x11 address
    DW_AT_high_pc,                 // 0x12 address, constant
    DW_AT_language,                // 0x13 constant
    DW_AT_discr,                   // 0x15 reference
    DW_AT_discr_value,             // 0x16 constant
    DW_AT_visibility,              // 0x17 constant
    DW_AT_import,                  // 0x18 reference
    DW_AT_string_length,           // 0x19 exprloc, loclistptr
    DW_AT_common_reference,        // 0x1a reference
    DW_AT_comp_dir,                // 0x1b string
    DW_AT_const_value,             // 0x1c block, constant, string
    DW_AT_containing_type,         // 0x1d reference
    DW_AT_default_value,           // 0x1e reference
    DW_AT_inline,                  // 0x20 constant
    DW_AT_is_optional,             // 0x21 flag
    DW_AT_lower_bound,             // 0x22 constant, exprloc, reference
    DW_AT_producer,                // 0x25 string
    DW_AT_prototyped,              // 0x27 flag
    DW_AT_return_addr,             // 0x2a exprloc, loclistptr
    DW_AT_start_scope,             // 0x2c Constant, rangelistptr
    DW_AT_bit_stride,              // 0x2e constant, exprloc, reference
    DW_AT_upper_bound,             // 0x2f constant, exprloc, reference
    DW_AT_abstract_origin,         // 0x31 reference
    DW_AT_accessibility,           // 0x32 constant
    DW_AT_address_class,           // 0x33 constant
    DW_AT_artificial,              // 0x34 flag
    DW_AT_base_types,              // 0x35 reference
    DW_AT_calling_convention,      // 0x36 constant
    DW_AT_count,                   // 0x37 constant, exprloc, reference
    DW_AT_data_member_location,    // 0x38 constant, exprloc, loclistptr
    DW_AT_decl_column,             // 0x39 constant
    DW_AT_decl_file,               // 0x3a constant
    DW_AT_decl_line,               // 0x3b constant
    DW_AT_declaration,             // 0x3c flag
    DW_AT_discr_list,              // 0x3d block
    DW_AT_encoding,                // 0x3e constant
    DW_AT_external,                // 0x3f flag
    DW_AT_frame_base,              // 0x40 exprloc, loclistptr
    DW_AT_friend,                  // 0x41 reference
    DW_AT_identifier_case,         // 0x42 constant
    DW_AT_macro_info,              // 0x43 macptr
    DW_AT_namelist_item,           // 0x44 reference
    DW_AT_priority,                // 0x45 reference
    DW_AT_segment,                 // 0x46 exprloc, loclistptr
    DW_AT_specification,           // 0x47 reference
    DW_AT_static_link,             // 0x48 exprloc, loclistptr
    DW_AT_type,                    // 0x49 reference
    DW_AT_use_location,            // 0x4a exprloc, loclistptr
    DW_AT_variable_parameter,      // 0x4b flag
    DW_AT_virtuality,              // 0x4c constant
    DW_AT_vtable_elem_location,    // 0x4d exprloc, loclistptr
    DW_AT_allocated,               // 0x4e constant, exprloc, reference
    DW_AT_associated,              // 0x4f constant, exprloc, reference
    DW_AT_data_location,           // 0x50 exprloc
    DW_AT_byte_stride,             // 0x51 constant, exprloc, reference
    DW_AT_entry_pc,                // 0x52 address
    DW_AT_use_UTF8,                // 0x53 flag
    DW_AT_extension,               // 0x54 reference
    DW_AT_ranges,                  // 0x55 rangelistptr
    DW_AT_trampoline,              // 0x56 address, flag, reference, string
    DW_AT_call_column,             // 0x57 constant
    DW_AT_call_file,               // 0x58 constant
    DW_AT_call_line,               // 0x59 constant
    DW_AT_description,             // 0x5a string
    DW_AT_binary_scale,            // 0x5b constant
    DW_AT_decimal_scale,           // 0x5c constant
    DW_AT_small,                   // 0x5d reference
    DW_AT_decimal_sign,            // 0x5e constant
    DW_AT_digit_count,             // 0x5f constant
    DW_AT_picture_string,          // 0x60 string
    DW_AT_mutable,                 // 0x61 flag
    DW_AT_threads_scaled,          // 0x62 flag
    DW_AT_explicit,                // 0x63 flag
    DW_AT_object_pointer,          // 0x64 reference
    DW_AT_endianity,               // 0x65 constant
    DW_AT_elemental,               // 0x66 flag
    DW_AT_pure,                    // 0x67 flag
    DW_AT_recursive,               // 0x68 flag
    DW_AT_signature,               // ‡ 0x69 reference
    DW_AT_main_subprogram,         // ‡ 0x6a flag
    DW_AT_data_bit_offset,         // ‡ 0x6b constant
    DW_AT_const_expr,              // ‡ 0x6c flag
    DW_AT_enum_class,              // ‡ 0x6d flag
    DW_AT_linkage_name,            // ‡ 0x6e string
    DW_AT_GNU_all_tail_call_sites, // 0x2116 flag, see https://sourceware.org/elfutils/DwarfExtensions
    DW_AT_GNU_all_call_sites,      // 0x2117 flag
    DW_AT_user(u64),               // [0x2000, 0x3fff] vendor extensions
    DW_AT_unknown(u64),            // anything else
}

#[allow(non_camel_case_types)] // figure 18
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    //                                  value
    DW_TAG_array_type,               // 0x01
    DW_TAG_class_type,               // 0x02
    DW_TAG_entry_point,              // 0x03
    DW_TAG_enumeration_type,         // 0x04
    DW_TAG_formal_parameter,         // 0x05
    DW_TAG_imported_declaration,     // 0x08
    DW_TAG_label,                    // 0x0a
    DW_TAG_lexical_block,            // 0x0b
    DW_TAG_member,                   // 0x0d
    DW_TAG_pointer_type,             // 0x0f
    DW_TAG_reference_type,           // 0x10
    DW_TAG_compile_unit,             // 0x11
    DW_TAG_string_type,              // 0x12
    DW_TAG_structure_type,           // 0x13
    DW_TAG_subroutine_type,          // 0x15
    DW_TAG_typedef,                  // 0x16
    DW_TAG_union_type,               // 0x17
    DW_TAG_unspecified_parameters,   // 0x18
    DW_TAG_variant,                  // 0x19
    DW_TAG_common_block,             // 0x1a
    DW_TAG_common_inclusion,         // 0x1b
    DW_TAG_inheritance,              // 0x1c
    DW_TAG_inlined_subroutine,       // 0x1d
    DW_TAG_module,                   // 0x1e
    DW_TAG_ptr_to_member_type,       // 0x1f
    DW_TAG_set_type,                 // 0x20
    DW_TAG_subrange_type,            // 0x21
    DW_TAG_with_stmt,                // 0x22
    DW_TAG_access_declaration,       // 0x23
    DW_TAG_base_type,                // 0x24
    DW_TAG_catch_block,              // 0x25
    DW_TAG_const_type,               // 0x26
    DW_TAG_constant,                 // 0x27
    DW_TAG_enumerator,               // 0x28
    DW_TAG_file_type,                // 0x29
    DW_TAG_friend,                   // 0x2a
    DW_TAG_namelist,                 // 0x2b
    DW_TAG_namelist_item,            // 0x2c
    DW_TAG_packed_type,              // 0x2d
    DW_TAG_subprogram,               // 0x2e
    DW_TAG_template_type_parameter,  // 0x2f
    DW_TAG_template_value_parameter, // 0x30
    DW_TAG_thrown_type,              // 0x31
    DW_TAG_try_block,                // 0x32
    DW_TAG_variant_part,             // 0x33
    DW_TAG_variable,                 // 0x34
    DW_TAG_volatile_type,            // 0x35
    DW_TAG_dwarf_procedure,          // 0x36
    DW_TAG_restrict_type,            // 0x37
    DW_TAG_interface_type,           // 0x38
    DW_TAG_namespace,                // 0x39
    DW_TAG_imported_module,          // 0x3a
    DW_TAG_unspecified_type,         // 0x3b
    DW_TAG_partial_unit,             // 0x3c
    DW_TAG_imported_unit,            // 0x3d
    DW_TAG_condition,                // 0x3f
    DW_TAG_shared_type,              // 0x40
    DW_TAG_type_unit,                // ‡, // 0x41
    DW_TAG_rvalue_reference_type,    // ‡, // 0x42
    DW_TAG_template_alias,           // ‡, // 0x43
    DW_TAG_user(u64),                // [0x4080, 0xffff]
    DW_TAG_unknown(u64),             // anything else
}

#[allow(non_camel_case_types)] // section 7
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormEncoding {
    //                       value & class
    DW_FORM_addr,         // 0x01 address
    DW_FORM_block2,       // 0x03 block
    DW_FORM_block4,       // 0x04 block
    DW_FORM_data2,        // 0x05 constant
    DW_FORM_data4,        // 0x06 constant
    DW_FORM_data8,        // 0x07 constant
    DW_FORM_string,       // 0x08 string
    DW_FORM_block,        // 0x09 block
    DW_FORM_block1,       // 0x0a block
    DW_FORM_data1,        // 0x0b constant
    DW_FORM_flag,         // 0x0c flag
    DW_FORM_sdata,        // 0x0d constant
    DW_FORM_strp,         // 0x0e string
    DW_FORM_udata,        // 0x0f constant
    DW_FORM_ref_addr,     // 0x10 reference
    DW_FORM_ref1,         // 0x11 reference
    DW_FORM_ref2,         // 0x12 reference
    DW_FORM_ref4,         // 0x13 reference
    DW_FORM_ref8,         // 0x14 reference
    DW_FORM_ref_udata,    // 0x15 reference
    DW_FORM_indirect,     // 0x16 (see Section 7.5.3 on page 203)
    DW_FORM_sec_offset, // 0x17 addrptr, lineptr, loclist, loclistsptr, macptr, rnglist, rnglistsptr, stroffsetsptr
    DW_FORM_exprloc,    // 0x18 exprloc
    DW_FORM_flag_present, // 0x19 flag
    DW_FORM_ref_sig8,     // 0x20 reference
    DW_FORM_unknown(u64), // not supported, e.g. the DWARF 5 forms
}

impl AttributeName {
    pub fn from_u64(value: u64) -> Self {
        match value {
            0x01 => AttributeName::DW_AT_sibling,
            0x02 => AttributeName::DW_AT_location,
            0x03 => AttributeName::DW_AT_name,
            0x09 => AttributeName::DW_AT_ordering,
            0x0b => AttributeName::DW_AT_byte_size,
            0x0c => AttributeName::DW_AT_bit_offset,
            0x0d => AttributeName::DW_AT_bit_size,
            0x10 => AttributeName::DW_AT_stmt_list,
            0x11 => AttributeName::DW_AT_low_pc,
            0x12 => AttributeName::DW_AT_high_pc,
            0x13 => AttributeName::DW_AT_language,
            0x15 => AttributeName::DW_AT_discr,
            0x16 => AttributeName::DW_AT_discr_value,
            0x17 => AttributeName::DW_AT_visibility,
            0x18 => AttributeName::DW_AT_import,
            0x19 => AttributeName::DW_AT_string_length,
            0x1a => AttributeName::DW_AT_common_reference,
            0x1b => AttributeName::DW_AT_comp_dir,
            0x1c => AttributeName::DW_AT_const_value,
            0x1d => AttributeName::DW_AT_containing_type,
            0x1e => AttributeName::DW_AT_default_value,
            0x20 => AttributeName::DW_AT_inline,
            0x21 => AttributeName::DW_AT_is_optional,
            0x22 => AttributeName::DW_AT_lower_bound,
            0x25 => AttributeName::DW_AT_producer,
            0x27 => AttributeName::DW_AT_prototyped,
            0x2a => AttributeName::DW_AT_return_addr,
            0x2c => AttributeName::DW_AT_start_scope,
            0x2e => AttributeName::DW_AT_bit_stride,
            0x2f => AttributeName::DW_AT_upper_bound,
            0x31 => AttributeName::DW_AT_abstract_origin,
            0x32 => AttributeName::DW_AT_accessibility,
            0x33 => AttributeName::DW_AT_address_class,
            0x34 => AttributeName::DW_AT_artificial,
            0x35 => AttributeName::DW_AT_base_types,
            0x36 => AttributeName::DW_AT_calling_convention,
            0x37 => AttributeName::DW_AT_count,
            0x38 => AttributeName::DW_AT_data_member_location,
            0x39 => AttributeName::DW_AT_decl_column,
            0x3a => AttributeName::DW_AT_decl_file,
            0x3b => AttributeName::DW_AT_decl_line,
            0x3c => AttributeName::DW_AT_declaration,
            0x3d => AttributeName::DW_AT_discr_list,
            0x3e => AttributeName::DW_AT_encoding,
            0x3f => AttributeName::DW_AT_external,
            0x40 => AttributeName::DW_AT_frame_base,
            0x41 => AttributeName::DW_AT_friend,
            0x42 => AttributeName::DW_AT_identifier_case,
            0x43 => AttributeName::DW_AT_macro_info,
            0x44 => AttributeName::DW_AT_namelist_item,
            0x45 => AttributeName::DW_AT_priority,
            0x46 => AttributeName::DW_AT_segment,
            0x47 => AttributeName::DW_AT_specification,
            0x48 => AttributeName::DW_AT_static_link,
            0x49 => AttributeName::DW_AT_type,
            0x4a => AttributeName::DW_AT_use_location,
            0x4b => AttributeName::DW_AT_variable_parameter,
            0x4c => AttributeName::DW_AT_virtuality,
            0x4d => AttributeName::DW_AT_vtable_elem_location,
            0x4e => AttributeName::DW_AT_allocated,
            0x4f => AttributeName::DW_AT_associated,
            0x50 => AttributeName::DW_AT_data_location,
            0x51 => AttributeName::DW_AT_byte_stride,
            0x52 => AttributeName::DW_AT_entry_pc,
            0x53 => AttributeName::DW_AT_use_UTF8,
            0x54 => AttributeName::DW_AT_extension,
            0x55 => AttributeName::DW_AT_ranges,
            0x56 => AttributeName::DW_AT_trampoline,
            0x57 => AttributeName::DW_AT_call_column,
            0x58 => AttributeName::DW_AT_call_file,
            0x59 => AttributeName::DW_AT_call_line,
            0x5a => AttributeName::DW_AT_description,
            0x5b => AttributeName::DW_AT_binary_scale,
            0x5c => AttributeName::DW_AT_decimal_scale,
            0x5d => AttributeName::DW_AT_small,
            0x5e => AttributeName::DW_AT_decimal_sign,
            0x5f => AttributeName::DW_AT_digit_count,
            0x60 => AttributeName::DW_AT_picture_string,
            0x61 => AttributeName::DW_AT_mutable,
            0x62 => AttributeName::DW_AT_threads_scaled,
            0x63 => AttributeName::DW_AT_explicit,
            0x64 => AttributeName::DW_AT_object_pointer,
            0x65 => AttributeName::DW_AT_endianity,
            0x66 => AttributeName::DW_AT_elemental,
            0x67 => AttributeName::DW_AT_pure,
            0x68 => AttributeName::DW_AT_recursive,
            0x69 => AttributeName::DW_AT_signature,
            0x6a => AttributeName::DW_AT_main_subprogram,
            0x6b => AttributeName::DW_AT_data_bit_offset,
            0x6c => AttributeName::DW_AT_const_expr,
            0x6d => AttributeName::DW_AT_enum_class,
            0x6e => AttributeName::DW_AT_linkage_name,
            0x2116 => AttributeName::DW_AT_GNU_all_tail_call_sites,
            0x2117 => AttributeName::DW_AT_GNU_all_call_sites,
            0x2000..=0x3fff => AttributeName::DW_AT_user(value),
            _ => AttributeName::DW_AT_unknown(value),
        }
    }
}

impl Tag {
    pub fn from_u64(value: u64) -> Self {
        match value {
            0x01 => Tag::DW_TAG_array_type,
            0x02 => Tag::DW_TAG_class_type,
            0x03 => Tag::DW_TAG_entry_point,
            0x04 => Tag::DW_TAG_enumeration_type,
            0x05 => Tag::DW_TAG_formal_parameter,
            0x08 => Tag::DW_TAG_imported_declaration,
            0x0a => Tag::DW_TAG_label,
            0x0b => Tag::DW_TAG_lexical_block,
            0x0d => Tag::DW_TAG_member,
            0x0f => Tag::DW_TAG_pointer_type,
            0x10 => Tag::DW_TAG_reference_type,
            0x11 => Tag::DW_TAG_compile_unit,
            0x12 => Tag::DW_TAG_string_type,
            0x13 => Tag::DW_TAG_structure_type,
            0x15 => Tag::DW_TAG_subroutine_type,
            0x16 => Tag::DW_TAG_typedef,
            0x17 => Tag::DW_TAG_union_type,
            0x18 => Tag::DW_TAG_unspecified_parameters,
            0x19 => Tag::DW_TAG_variant,
            0x1a => Tag::DW_TAG_common_block,
            0x1b => Tag::DW_TAG_common_inclusion,
            0x1c => Tag::DW_TAG_inheritance,
            0x1d => Tag::DW_TAG_inlined_subroutine,
            0x1e => Tag::DW_TAG_module,
            0x1f => Tag::DW_TAG_ptr_to_member_type,
            0x20 => Tag::DW_TAG_set_type,
            0x21 => Tag::DW_TAG_subrange_type,
            0x22 => Tag::DW_TAG_with_stmt,
            0x23 => Tag::DW_TAG_access_declaration,
            0x24 => Tag::DW_TAG_base_type,
            0x25 => Tag::DW_TAG_catch_block,
            0x26 => Tag::DW_TAG_const_type,
            0x27 => Tag::DW_TAG_constant,
            0x28 => Tag::DW_TAG_enumerator,
            0x29 => Tag::DW_TAG_file_type,
            0x2a => Tag::DW_TAG_friend,
            0x2b => Tag::DW_TAG_namelist,
            0x2c => Tag::DW_TAG_namelist_item,
            0x2d => Tag::DW_TAG_packed_type,
            0x2e => Tag::DW_TAG_subprogram,
            0x2f => Tag::DW_TAG_template_type_parameter,
            0x30 => Tag::DW_TAG_template_value_parameter,
            0x31 => Tag::DW_TAG_thrown_type,
            0x32 => Tag::DW_TAG_try_block,
            0x33 => Tag::DW_TAG_variant_part,
            0x34 => Tag::DW_TAG_variable,
            0x35 => Tag::DW_TAG_volatile_type,
            0x36 => Tag::DW_TAG_dwarf_procedure,
            0x37 => Tag::DW_TAG_restrict_type,
            0x38 => Tag::DW_TAG_interface_type,
            0x39 => Tag::DW_TAG_namespace,
            0x3a => Tag::DW_TAG_imported_module,
            0x3b => Tag::DW_TAG_unspecified_type,
            0x3c => Tag::DW_TAG_partial_unit,
            0x3d => Tag::DW_TAG_imported_unit,
            0x3f => Tag::DW_TAG_condition,
            0x40 => Tag::DW_TAG_shared_type,
            0x41 => Tag::DW_TAG_type_unit,
            0x42 => Tag::DW_TAG_rvalue_reference_type,
            0x43 => Tag::DW_TAG_template_alias,
            0x4080..=0xffff => Tag::DW_TAG_user(value),
            _ => Tag::DW_TAG_unknown(value),
        }
    }
}

impl FormEncoding {
    pub fn from_u64(value: u64) -> Self {
        match value {
            0x01 => FormEncoding::DW_FORM_addr,
            0x03 => FormEncoding::DW_FORM_block2,
            0x04 => FormEncoding::DW_FORM_block4,
            0x05 => FormEncoding::DW_FORM_data2,
            0x06 => FormEncoding::DW_FORM_data4,
            0x07 => FormEncoding::DW_FORM_data8,
            0x08 => FormEncoding::DW_FORM_string,
            0x09 => FormEncoding::DW_FORM_block,
            0x0a => FormEncoding::DW_FORM_block1,
            0x0b => FormEncoding::DW_FORM_data1,
            0x0c => FormEncoding::DW_FORM_flag,
            0x0d => FormEncoding::DW_FORM_sdata,
            0x0e => FormEncoding::DW_FORM_strp,
            0x0f => FormEncoding::DW_FORM_udata,
            0x10 => FormEncoding::DW_FORM_ref_addr,
            0x11 => FormEncoding::DW_FORM_ref1,
            0x12 => FormEncoding::DW_FORM_ref2,
            0x13 => FormEncoding::DW_FORM_ref4,
            0x14 => FormEncoding::DW_FORM_ref8,
            0x15 => FormEncoding::DW_FORM_ref_udata,
            0x16 => FormEncoding::DW_FORM_indirect,
            0x17 => FormEncoding::DW_FORM_sec_offset,
            0x18 => FormEncoding::DW_FORM_exprloc,
            0x19 => FormEncoding::DW_FORM_flag_present,
            0x20 => FormEncoding::DW_FORM_ref_sig8,
            _ => FormEncoding::DW_FORM_unknown(value),
        }
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeName::DW_AT_user(value) => write!(f, "DW_AT_user(0x{value:x})"),
            AttributeName::DW_AT_unknown(value) => write!(f, "DW_AT_unknown(0x{value:x})"),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Tag::DW_TAG_user(value) => write!(f, "DW_TAG_user(0x{value:x})"),
            Tag::DW_TAG_unknown(value) => write!(f, "DW_TAG_unknown(0x{value:x})"),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl fmt::Display for FormEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormEncoding::DW_FORM_unknown(value) => write!(f, "DW_FORM_unknown(0x{value:x})"),
            _ => write!(f, "{self:?}"),
        }
    }
}
