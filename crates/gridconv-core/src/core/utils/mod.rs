pub mod box_size;
