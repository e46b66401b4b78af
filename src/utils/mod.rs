pub mod files;
pub mod struct_pack;
