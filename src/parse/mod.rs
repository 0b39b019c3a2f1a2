pub mod extrusion_xml;
