mod bind_test;
mod collection_test;
mod datetime_test;
mod logic_test;
mod object_test;
