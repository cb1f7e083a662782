mod console_view;
