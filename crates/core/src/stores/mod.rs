mod supabase;

pub use supabase::SupabaseStore;
